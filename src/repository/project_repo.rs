// ==========================================
// PrintFlow APS - Project repository
// ==========================================

use crate::domain::project::Project;
use crate::domain::types::{ProjectStatus, Urgency};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{date_from_row, datetime_from_row, fmt_date, fmt_datetime};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const COLUMNS: &str = "project_id, cloud_id, legacy_id, name, product_id, color, \
     target_quantity, completed_quantity, scrap_quantity, due_date, urgency, \
     manual_urgency_override, status, include_in_planning, preferred_preset_id, \
     custom_cycle_hours, parent_project_id, created_at, updated_at";

// ==========================================
// ProjectRepository
// ==========================================
pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Project> {
        Ok(Project {
            project_id: row.get(0)?,
            cloud_id: row.get(1)?,
            legacy_id: row.get(2)?,
            name: row.get(3)?,
            product_id: row.get(4)?,
            color: row.get(5)?,
            target_quantity: row.get(6)?,
            completed_quantity: row.get(7)?,
            scrap_quantity: row.get(8)?,
            due_date: date_from_row(row, 9)?,
            urgency: Urgency::from_db_str(&row.get::<_, String>(10)?),
            manual_urgency_override: row.get::<_, i64>(11)? != 0,
            status: ProjectStatus::from_db_str(&row.get::<_, String>(12)?),
            include_in_planning: row.get::<_, i64>(13)? != 0,
            preferred_preset_id: row.get(14)?,
            custom_cycle_hours: row.get(15)?,
            parent_project_id: row.get(16)?,
            created_at: datetime_from_row(row, 17)?,
            updated_at: datetime_from_row(row, 18)?,
        })
    }

    pub fn upsert(&self, project: &Project) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO projects (
                project_id, cloud_id, legacy_id, name, product_id, color,
                target_quantity, completed_quantity, scrap_quantity, due_date, urgency,
                manual_urgency_override, status, include_in_planning, preferred_preset_id,
                custom_cycle_hours, parent_project_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(project_id) DO UPDATE SET
                cloud_id = excluded.cloud_id,
                legacy_id = excluded.legacy_id,
                name = excluded.name,
                product_id = excluded.product_id,
                color = excluded.color,
                target_quantity = excluded.target_quantity,
                completed_quantity = excluded.completed_quantity,
                scrap_quantity = excluded.scrap_quantity,
                due_date = excluded.due_date,
                urgency = excluded.urgency,
                manual_urgency_override = excluded.manual_urgency_override,
                status = excluded.status,
                include_in_planning = excluded.include_in_planning,
                preferred_preset_id = excluded.preferred_preset_id,
                custom_cycle_hours = excluded.custom_cycle_hours,
                parent_project_id = excluded.parent_project_id,
                updated_at = excluded.updated_at"#,
            params![
                &project.project_id,
                &project.cloud_id,
                &project.legacy_id,
                &project.name,
                &project.product_id,
                &project.color,
                project.target_quantity,
                project.completed_quantity,
                project.scrap_quantity,
                fmt_date(project.due_date),
                project.urgency.to_db_str(),
                project.manual_urgency_override as i64,
                project.status.to_db_str(),
                project.include_in_planning as i64,
                &project.preferred_preset_id,
                project.custom_cycle_hours,
                &project.parent_project_id,
                fmt_datetime(project.created_at),
                fmt_datetime(project.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, project_id: &str) -> RepositoryResult<Option<Project>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM projects WHERE project_id = ?", COLUMNS);
        match conn.query_row(&sql, params![project_id], Self::map_row) {
            Ok(project) => Ok(Some(project)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Projects the planner may consider: active status, planning flag on.
    pub fn list_active(&self) -> RepositoryResult<Vec<Project>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM projects \
             WHERE status IN ('PENDING', 'IN_PROGRESS') AND include_in_planning = 1 \
             ORDER BY due_date ASC, project_id ASC",
            COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let projects = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Project>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM projects ORDER BY due_date ASC, project_id ASC",
            COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let projects = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub fn delete(&self, project_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let n = conn.execute(
            "DELETE FROM projects WHERE project_id = ?",
            params![project_id],
        )?;
        Ok(n > 0)
    }
}
