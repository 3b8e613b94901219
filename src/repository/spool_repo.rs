// ==========================================
// PrintFlow APS - Spool & color inventory repository
// ==========================================

use crate::domain::spool::{ColorInventoryItem, Spool};
use crate::domain::types::SpoolState;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// SpoolRepository
// ==========================================
pub struct SpoolRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SpoolRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_spool(row: &Row<'_>) -> rusqlite::Result<Spool> {
        Ok(Spool {
            spool_id: row.get(0)?,
            color: row.get(1)?,
            material: row.get(2)?,
            package_grams: row.get(3)?,
            estimated_grams_remaining: row.get(4)?,
            state: SpoolState::from_db_str(&row.get::<_, String>(5)?),
        })
    }

    fn map_inventory(row: &Row<'_>) -> rusqlite::Result<ColorInventoryItem> {
        Ok(ColorInventoryItem {
            color: row.get(0)?,
            material: row.get(1)?,
            closed_count: row.get(2)?,
            closed_spool_grams: row.get(3)?,
            open_total_grams: row.get(4)?,
        })
    }

    pub fn upsert_spool(&self, spool: &Spool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO spools (
                spool_id, color, material, package_grams, estimated_grams_remaining, state
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(spool_id) DO UPDATE SET
                color = excluded.color,
                material = excluded.material,
                package_grams = excluded.package_grams,
                estimated_grams_remaining = excluded.estimated_grams_remaining,
                state = excluded.state"#,
            params![
                &spool.spool_id,
                &spool.color,
                &spool.material,
                spool.package_grams,
                spool.estimated_grams_remaining,
                spool.state.to_db_str(),
            ],
        )?;
        Ok(())
    }

    pub fn list_spools(&self) -> RepositoryResult<Vec<Spool>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT spool_id, color, material, package_grams, estimated_grams_remaining, state \
             FROM spools ORDER BY spool_id",
        )?;
        let spools = stmt
            .query_map([], Self::map_spool)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(spools)
    }

    pub fn upsert_inventory(&self, item: &ColorInventoryItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO color_inventory (
                color, material, closed_count, closed_spool_grams, open_total_grams
            ) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(color, material) DO UPDATE SET
                closed_count = excluded.closed_count,
                closed_spool_grams = excluded.closed_spool_grams,
                open_total_grams = excluded.open_total_grams"#,
            params![
                &item.color,
                &item.material,
                item.closed_count,
                item.closed_spool_grams,
                item.open_total_grams,
            ],
        )?;
        Ok(())
    }

    pub fn list_inventory(&self) -> RepositoryResult<Vec<ColorInventoryItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT color, material, closed_count, closed_spool_grams, open_total_grams \
             FROM color_inventory ORDER BY color, material",
        )?;
        let items = stmt
            .query_map([], Self::map_inventory)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}
