// ==========================================
// PrintFlow APS - Planned cycle repository
// ==========================================
// The plan is replaced atomically: one transaction
// writes the full preserved+new set or nothing.
// ==========================================

use crate::domain::cycle::PlannedCycle;
use crate::domain::types::{CycleSource, CycleStatus, PlateType, ReadinessState, ShiftKind};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{datetime_from_row, fmt_datetime};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const COLUMNS: &str = "cycle_id, project_id, printer_id, units_planned, grams_planned, \
     plate_type, start_time, end_time, shift, status, readiness_state, readiness_details, \
     required_color, required_grams, suggested_spools_json, preset_id, preset_reason, \
     plate_index, plate_release_time, source, locked";

// ==========================================
// CycleRepository
// ==========================================
pub struct CycleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CycleRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<PlannedCycle> {
        let spools_json: String = row.get(14)?;
        let suggested_spool_ids: Vec<String> =
            serde_json::from_str(&spools_json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    14,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
        Ok(PlannedCycle {
            cycle_id: row.get(0)?,
            project_id: row.get(1)?,
            printer_id: row.get(2)?,
            units_planned: row.get(3)?,
            grams_planned: row.get(4)?,
            plate_type: PlateType::from_db_str(&row.get::<_, String>(5)?),
            start_time: datetime_from_row(row, 6)?,
            end_time: datetime_from_row(row, 7)?,
            shift: ShiftKind::from_db_str(&row.get::<_, String>(8)?),
            status: CycleStatus::from_db_str(&row.get::<_, String>(9)?),
            readiness_state: ReadinessState::from_db_str(&row.get::<_, String>(10)?),
            readiness_details: row.get(11)?,
            required_color: row.get(12)?,
            required_grams: row.get(13)?,
            suggested_spool_ids,
            preset_id: row.get(15)?,
            preset_reason: row.get(16)?,
            plate_index: row.get(17)?,
            plate_release_time: datetime_from_row(row, 18)?,
            source: CycleSource::from_db_str(&row.get::<_, String>(19)?),
            locked: row.get::<_, i64>(20)? != 0,
        })
    }

    fn insert_in_tx(tx: &rusqlite::Transaction<'_>, cycle: &PlannedCycle) -> RepositoryResult<()> {
        let spools_json = serde_json::to_string(&cycle.suggested_spool_ids)?;
        tx.execute(
            r#"INSERT INTO planned_cycles (
                cycle_id, project_id, printer_id, units_planned, grams_planned,
                plate_type, start_time, end_time, shift, status, readiness_state,
                readiness_details, required_color, required_grams, suggested_spools_json,
                preset_id, preset_reason, plate_index, plate_release_time, source, locked
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &cycle.cycle_id,
                &cycle.project_id,
                &cycle.printer_id,
                cycle.units_planned,
                cycle.grams_planned,
                cycle.plate_type.to_db_str(),
                fmt_datetime(cycle.start_time),
                fmt_datetime(cycle.end_time),
                cycle.shift.to_db_str(),
                cycle.status.to_db_str(),
                cycle.readiness_state.to_db_str(),
                &cycle.readiness_details,
                &cycle.required_color,
                cycle.required_grams,
                spools_json,
                &cycle.preset_id,
                &cycle.preset_reason,
                cycle.plate_index,
                fmt_datetime(cycle.plate_release_time),
                cycle.source.to_db_str(),
                cycle.locked as i64,
            ],
        )?;
        Ok(())
    }

    pub fn insert(&self, cycle: &PlannedCycle) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Self::insert_in_tx(&tx, cycle)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// Atomically replace the whole plan with the supplied set
    /// (preserved + newly produced cycles).
    pub fn replace_all(&self, cycles: &[PlannedCycle]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        tx.execute("DELETE FROM planned_cycles", [])?;
        for cycle in cycles {
            Self::insert_in_tx(&tx, cycle)?;
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<PlannedCycle>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM planned_cycles ORDER BY printer_id, start_time",
            COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let cycles = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cycles)
    }

    pub fn list_from(&self, from: NaiveDateTime) -> RepositoryResult<Vec<PlannedCycle>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM planned_cycles WHERE start_time >= ? ORDER BY printer_id, start_time",
            COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let cycles = stmt
            .query_map(params![fmt_datetime(from)], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cycles)
    }

    /// Execution-layer transition. The planner itself never calls this.
    pub fn set_status(&self, cycle_id: &str, status: CycleStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let n = conn.execute(
            "UPDATE planned_cycles SET status = ? WHERE cycle_id = ?",
            params![status.to_db_str(), cycle_id],
        )?;
        if n == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PlannedCycle".to_string(),
                id: cycle_id.to_string(),
            });
        }
        Ok(())
    }
}
