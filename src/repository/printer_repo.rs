// ==========================================
// PrintFlow APS - Printer repository
// ==========================================
// AMS slot state serializes as a JSON column; it is
// runtime-owned and never synced from the mirror.
// ==========================================

use crate::domain::printer::{AmsSlotState, Printer};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const COLUMNS: &str = "printer_id, name, active, has_ams, ams_slot_count, \
     ams_backup_same_color, ams_multi_color, can_start_new_cycles_after_hours, \
     physical_plate_capacity, mounted_spool_id, mounted_color, ams_slots_json";

// ==========================================
// PrinterRepository
// ==========================================
pub struct PrinterRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PrinterRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Printer> {
        let slots_json: String = row.get(11)?;
        let ams_slots: Vec<AmsSlotState> = serde_json::from_str(&slots_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Printer {
            printer_id: row.get(0)?,
            name: row.get(1)?,
            active: row.get::<_, i64>(2)? != 0,
            has_ams: row.get::<_, i64>(3)? != 0,
            ams_slot_count: row.get(4)?,
            ams_backup_same_color: row.get::<_, i64>(5)? != 0,
            ams_multi_color: row.get::<_, i64>(6)? != 0,
            can_start_new_cycles_after_hours: row.get::<_, i64>(7)? != 0,
            physical_plate_capacity: row.get(8)?,
            mounted_spool_id: row.get(9)?,
            mounted_color: row.get(10)?,
            ams_slots,
        })
    }

    pub fn upsert(&self, printer: &Printer) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let slots_json = serde_json::to_string(&printer.ams_slots)?;
        conn.execute(
            r#"INSERT INTO printers (
                printer_id, name, active, has_ams, ams_slot_count,
                ams_backup_same_color, ams_multi_color, can_start_new_cycles_after_hours,
                physical_plate_capacity, mounted_spool_id, mounted_color, ams_slots_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(printer_id) DO UPDATE SET
                name = excluded.name,
                active = excluded.active,
                has_ams = excluded.has_ams,
                ams_slot_count = excluded.ams_slot_count,
                ams_backup_same_color = excluded.ams_backup_same_color,
                ams_multi_color = excluded.ams_multi_color,
                can_start_new_cycles_after_hours = excluded.can_start_new_cycles_after_hours,
                physical_plate_capacity = excluded.physical_plate_capacity,
                mounted_spool_id = excluded.mounted_spool_id,
                mounted_color = excluded.mounted_color,
                ams_slots_json = excluded.ams_slots_json"#,
            params![
                &printer.printer_id,
                &printer.name,
                printer.active as i64,
                printer.has_ams as i64,
                printer.ams_slot_count,
                printer.ams_backup_same_color as i64,
                printer.ams_multi_color as i64,
                printer.can_start_new_cycles_after_hours as i64,
                printer.physical_plate_capacity,
                &printer.mounted_spool_id,
                &printer.mounted_color,
                slots_json,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, printer_id: &str) -> RepositoryResult<Option<Printer>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM printers WHERE printer_id = ?", COLUMNS);
        match conn.query_row(&sql, params![printer_id], Self::map_row) {
            Ok(printer) => Ok(Some(printer)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_active(&self) -> RepositoryResult<Vec<Printer>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM printers WHERE active = 1 ORDER BY printer_id",
            COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let printers = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(printers)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Printer>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM printers ORDER BY printer_id", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let printers = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(printers)
    }

    /// Runtime color update after a cycle is placed or a spool swapped.
    /// Local-only field; the remote mirror never writes it.
    pub fn set_mounted_color(
        &self,
        printer_id: &str,
        spool_id: Option<&str>,
        color: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let n = conn.execute(
            "UPDATE printers SET mounted_spool_id = ?, mounted_color = ? WHERE printer_id = ?",
            params![spool_id, color, printer_id],
        )?;
        if n == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Printer".to_string(),
                id: printer_id.to_string(),
            });
        }
        Ok(())
    }
}
