// ==========================================
// PrintFlow APS - Repository layer
// ==========================================
// Data access over SQLite. Repositories share one
// Arc<Mutex<Connection>>; the engine never touches
// SQL directly.
// ==========================================

pub mod cycle_repo;
pub mod error;
pub mod printer_repo;
pub mod product_repo;
pub mod project_repo;
pub mod settings_repo;
pub mod spool_repo;

pub use cycle_repo::CycleRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use printer_repo::PrinterRepository;
pub use product_repo::ProductRepository;
pub use project_repo::ProjectRepository;
pub use settings_repo::SettingsRepository;
pub use spool_repo::SpoolRepository;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Row;

/// Storage format for timestamps.
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
/// Storage format for dates.
pub const DATE_FMT: &str = "%Y-%m-%d";

pub(crate) fn fmt_datetime(t: NaiveDateTime) -> String {
    t.format(DATETIME_FMT).to_string()
}

pub(crate) fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

/// Parse a TEXT timestamp column inside map_row, surfacing failures as
/// rusqlite conversion errors.
pub(crate) fn datetime_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a TEXT date column inside map_row.
pub(crate) fn date_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(raw.trim(), DATE_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
