// ==========================================
// PrintFlow APS - Engine repository aggregate
// ==========================================
// Bundles every repository the planner needs behind
// one struct, and builds the immutable snapshot a
// planning run consumes.
// ==========================================

use crate::repository::{
    CycleRepository, PrinterRepository, ProductRepository, ProjectRepository, RepositoryResult,
    SettingsRepository, SpoolRepository,
};
use crate::engine::snapshot::PlanningSnapshot;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// PlanningRepositories
// ==========================================
#[derive(Clone)]
pub struct PlanningRepositories {
    pub projects: Arc<ProjectRepository>,
    pub products: Arc<ProductRepository>,
    pub printers: Arc<PrinterRepository>,
    pub spools: Arc<SpoolRepository>,
    pub cycles: Arc<CycleRepository>,
    pub settings: Arc<SettingsRepository>,
}

impl PlanningRepositories {
    /// Wire every repository onto one shared connection.
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            projects: Arc::new(ProjectRepository::new(conn.clone())),
            products: Arc::new(ProductRepository::new(conn.clone())),
            printers: Arc::new(PrinterRepository::new(conn.clone())),
            spools: Arc::new(SpoolRepository::new(conn.clone())),
            cycles: Arc::new(CycleRepository::new(conn.clone())),
            settings: Arc::new(SettingsRepository::new(conn)),
        }
    }

    /// Read everything a planning run needs in one pass. The snapshot
    /// is immutable; the engine never goes back to the store mid-run.
    pub fn snapshot(&self, now: NaiveDateTime) -> RepositoryResult<PlanningSnapshot> {
        Ok(PlanningSnapshot {
            now,
            settings: self.settings.get_settings()?,
            settings_present: self.settings.has_settings()?,
            printers: self.printers.list_active()?,
            products: self.products.list_all()?,
            projects: self.projects.list_active()?,
            spools: self.spools.list_spools()?,
            inventory: self.spools.list_inventory()?,
            existing_cycles: self.cycles.list_all()?,
        })
    }
}
