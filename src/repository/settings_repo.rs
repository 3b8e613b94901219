// ==========================================
// PrintFlow APS - Settings / meta / planning log
// ==========================================
// Factory settings and planning meta live as JSON
// documents in settings_kv. The planning log is a
// ring of the most recent run summaries, pruned on
// every insert.
// ==========================================

use crate::domain::meta::{PlanningMeta, PlanningRunSummary, PLANNING_LOG_RETENTION};
use crate::domain::settings::FactorySettings;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{datetime_from_row, fmt_datetime};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const KEY_FACTORY_SETTINGS: &str = "factory_settings";
const KEY_PLANNING_META: &str = "planning_meta";

// ==========================================
// SettingsRepository
// ==========================================
pub struct SettingsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SettingsRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn read_kv(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        match conn.query_row(
            "SELECT value FROM settings_kv WHERE key = ?",
            params![key],
            |row| row.get::<_, String>(0),
        ) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_kv(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO settings_kv (key, value, updated_at)
               VALUES (?, ?, datetime('now'))
               ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at"#,
            params![key, value],
        )?;
        Ok(())
    }

    // ==========================================
    // Factory settings
    // ==========================================

    /// Missing settings fall back to the typed defaults so a fresh
    /// database is immediately plannable.
    pub fn get_settings(&self) -> RepositoryResult<FactorySettings> {
        match self.read_kv(KEY_FACTORY_SETTINGS)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(FactorySettings::default()),
        }
    }

    /// Whether settings were ever explicitly saved. The planner reports
    /// a blocking issue when it has to run on an unconfigured factory.
    pub fn has_settings(&self) -> RepositoryResult<bool> {
        Ok(self.read_kv(KEY_FACTORY_SETTINGS)?.is_some())
    }

    pub fn save_settings(&self, settings: &FactorySettings) -> RepositoryResult<()> {
        let raw = serde_json::to_string(settings)?;
        self.write_kv(KEY_FACTORY_SETTINGS, &raw)
    }

    // ==========================================
    // Planning meta
    // ==========================================

    pub fn get_planning_meta(&self) -> RepositoryResult<PlanningMeta> {
        match self.read_kv(KEY_PLANNING_META)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(PlanningMeta::default()),
        }
    }

    pub fn save_planning_meta(&self, meta: &PlanningMeta) -> RepositoryResult<()> {
        let raw = serde_json::to_string(meta)?;
        self.write_kv(KEY_PLANNING_META, &raw)
    }

    /// Capacity-affecting writes (printer added, schedule edited) flag
    /// the plan as stale until the next recalculation clears it.
    pub fn mark_capacity_changed(&self, reason: &str) -> RepositoryResult<()> {
        let mut meta = self.get_planning_meta()?;
        meta.capacity_changed_since_last_recalculation = true;
        meta.last_capacity_change_reason = Some(reason.to_string());
        self.save_planning_meta(&meta)
    }

    // ==========================================
    // Planning log ring
    // ==========================================

    fn map_log_row(row: &Row<'_>) -> rusqlite::Result<PlanningRunSummary> {
        Ok(PlanningRunSummary {
            entry_id: row.get(0)?,
            started_at: datetime_from_row(row, 1)?,
            reason: row.get(2)?,
            scope: row.get(3)?,
            projects_considered: row.get(4)?,
            printers_available: row.get(5)?,
            cycles_preserved: row.get(6)?,
            cycles_created: row.get(7)?,
            units_planned: row.get(8)?,
            warnings: row.get(9)?,
            errors: row.get(10)?,
            duration_ms: row.get(11)?,
        })
    }

    pub fn append_planning_log(&self, entry: &PlanningRunSummary) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO planning_log (
                entry_id, started_at, reason, scope, projects_considered,
                printers_available, cycles_preserved, cycles_created, units_planned,
                warnings, errors, duration_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &entry.entry_id,
                fmt_datetime(entry.started_at),
                &entry.reason,
                &entry.scope,
                entry.projects_considered,
                entry.printers_available,
                entry.cycles_preserved,
                entry.cycles_created,
                entry.units_planned,
                entry.warnings,
                entry.errors,
                entry.duration_ms,
            ],
        )?;
        // Keep only the newest entries.
        conn.execute(
            r#"DELETE FROM planning_log WHERE entry_id NOT IN (
                SELECT entry_id FROM planning_log
                ORDER BY started_at DESC, entry_id DESC
                LIMIT ?
            )"#,
            params![PLANNING_LOG_RETENTION as i64],
        )?;
        Ok(())
    }

    pub fn recent_planning_runs(&self, limit: usize) -> RepositoryResult<Vec<PlanningRunSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT entry_id, started_at, reason, scope, projects_considered,
                      printers_available, cycles_preserved, cycles_created, units_planned,
                      warnings, errors, duration_ms
               FROM planning_log
               ORDER BY started_at DESC, entry_id DESC
               LIMIT ?"#,
        )?;
        let entries = stmt
            .query_map(params![limit as i64], Self::map_log_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
