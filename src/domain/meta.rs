// ==========================================
// PrintFlow APS - Planning metadata & run log
// ==========================================
// Small persisted records around the planner: when
// it last ran, whether capacity changed since, and a
// bounded ring of run summaries.
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How many run summaries the planning log retains.
pub const PLANNING_LOG_RETENTION: usize = 50;

// ==========================================
// PlanningMeta
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningMeta {
    pub last_recalculated_at: Option<NaiveDateTime>,
    pub capacity_changed_since_last_recalculation: bool,
    pub last_capacity_change_reason: Option<String>,
}

// ==========================================
// PlanningRunSummary - one planning-log entry
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningRunSummary {
    pub entry_id: String,          // log entry ID
    pub started_at: NaiveDateTime, // injected planning clock of the run
    pub reason: String,            // caller-supplied trigger description
    pub scope: String,             // FROM_NOW / FROM_TOMORROW / WHOLE_WEEK

    // Input snapshot counts
    pub projects_considered: i64,
    pub printers_available: i64,
    pub cycles_preserved: i64,

    // Outputs
    pub cycles_created: i64,
    pub units_planned: i64,
    pub warnings: i64,
    pub errors: i64,
    pub duration_ms: i64,
}
