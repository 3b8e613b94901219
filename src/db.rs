// ==========================================
// PrintFlow APS - SQLite connection & schema
// ==========================================
// Single place that owns PRAGMA policy and schema
// bootstrap so every connection behaves the same
// (foreign keys on, shared busy timeout).
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// Default busy_timeout (milliseconds).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Schema version the code expects.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Apply the unified PRAGMA set. foreign_keys and busy_timeout are
/// per-connection settings in SQLite, so every open path goes through
/// here.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a connection with the unified configuration applied.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Create all tables if they do not exist yet and stamp the schema
/// version. Idempotent.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS products (
            product_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            grams_per_unit REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS plate_presets (
            preset_id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL REFERENCES products(product_id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            units_per_plate INTEGER NOT NULL,
            cycle_hours REAL NOT NULL,
            risk_level TEXT NOT NULL DEFAULT 'LOW',
            allowed_for_night_cycle INTEGER NOT NULL DEFAULT 0,
            recommended INTEGER NOT NULL DEFAULT 0,
            sort_order INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS projects (
            project_id TEXT PRIMARY KEY,
            cloud_id TEXT,
            legacy_id TEXT,
            name TEXT NOT NULL,
            product_id TEXT NOT NULL,
            color TEXT NOT NULL,
            target_quantity INTEGER NOT NULL,
            completed_quantity INTEGER NOT NULL DEFAULT 0,
            scrap_quantity INTEGER NOT NULL DEFAULT 0,
            due_date TEXT NOT NULL,
            urgency TEXT NOT NULL DEFAULT 'NORMAL',
            manual_urgency_override INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'PENDING',
            include_in_planning INTEGER NOT NULL DEFAULT 1,
            preferred_preset_id TEXT,
            custom_cycle_hours REAL,
            parent_project_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS printers (
            printer_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            has_ams INTEGER NOT NULL DEFAULT 0,
            ams_slot_count INTEGER NOT NULL DEFAULT 0,
            ams_backup_same_color INTEGER NOT NULL DEFAULT 0,
            ams_multi_color INTEGER NOT NULL DEFAULT 0,
            can_start_new_cycles_after_hours INTEGER NOT NULL DEFAULT 0,
            physical_plate_capacity INTEGER NOT NULL DEFAULT 4,
            mounted_spool_id TEXT,
            mounted_color TEXT,
            ams_slots_json TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS spools (
            spool_id TEXT PRIMARY KEY,
            color TEXT NOT NULL,
            material TEXT NOT NULL DEFAULT 'PLA',
            package_grams REAL NOT NULL,
            estimated_grams_remaining REAL NOT NULL,
            state TEXT NOT NULL DEFAULT 'AVAILABLE'
        );

        CREATE TABLE IF NOT EXISTS color_inventory (
            color TEXT NOT NULL,
            material TEXT NOT NULL DEFAULT 'PLA',
            closed_count INTEGER NOT NULL DEFAULT 0,
            closed_spool_grams REAL NOT NULL DEFAULT 0,
            open_total_grams REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (color, material)
        );

        CREATE TABLE IF NOT EXISTS planned_cycles (
            cycle_id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            printer_id TEXT NOT NULL,
            units_planned INTEGER NOT NULL,
            grams_planned REAL NOT NULL,
            plate_type TEXT NOT NULL DEFAULT 'FULL',
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            shift TEXT NOT NULL DEFAULT 'DAY',
            status TEXT NOT NULL DEFAULT 'PLANNED',
            readiness_state TEXT NOT NULL DEFAULT 'READY',
            readiness_details TEXT,
            required_color TEXT NOT NULL,
            required_grams REAL NOT NULL,
            suggested_spools_json TEXT NOT NULL DEFAULT '[]',
            preset_id TEXT NOT NULL,
            preset_reason TEXT,
            plate_index INTEGER NOT NULL DEFAULT 1,
            plate_release_time TEXT NOT NULL,
            source TEXT NOT NULL DEFAULT 'AUTO',
            locked INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_cycles_printer_start
            ON planned_cycles(printer_id, start_time);
        CREATE INDEX IF NOT EXISTS idx_cycles_status
            ON planned_cycles(status);

        CREATE TABLE IF NOT EXISTS settings_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS planning_log (
            entry_id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            reason TEXT NOT NULL,
            scope TEXT NOT NULL,
            projects_considered INTEGER NOT NULL,
            printers_available INTEGER NOT NULL,
            cycles_preserved INTEGER NOT NULL,
            cycles_created INTEGER NOT NULL,
            units_planned INTEGER NOT NULL,
            warnings INTEGER NOT NULL,
            errors INTEGER NOT NULL,
            duration_ms INTEGER NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Read the stamped schema_version (None when the table is absent,
/// i.e. an uninitialized database).
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    use rusqlite::OptionalExtension;

    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
