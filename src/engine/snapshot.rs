// ==========================================
// PrintFlow APS - Planning snapshot & result types
// ==========================================
// The engine is a pure function over an immutable
// snapshot of store state. Domain conditions come
// back as structured issues and warnings, never as
// errors.
// ==========================================

use crate::domain::cycle::PlannedCycle;
use crate::domain::printer::Printer;
use crate::domain::product::Product;
use crate::domain::project::Project;
use crate::domain::settings::FactorySettings;
use crate::domain::spool::{ColorInventoryItem, Spool};
use crate::domain::types::PlanScope;
use crate::engine::events::RunLogSummary;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// PlanningSnapshot - immutable engine input
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanningSnapshot {
    /// Injected planning clock. Never read from the system inside the
    /// engine, so every run is replayable.
    pub now: NaiveDateTime,
    pub settings: FactorySettings,
    pub settings_present: bool,
    pub printers: Vec<Printer>,
    pub products: Vec<Product>,
    pub projects: Vec<Project>,
    pub spools: Vec<Spool>,
    pub inventory: Vec<ColorInventoryItem>,
    pub existing_cycles: Vec<PlannedCycle>,
}

// ==========================================
// PlanOptions
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub start_time: NaiveDateTime,
    pub days_to_plan: i64,
    pub scope: PlanScope,
    pub lock_in_progress: bool,
}

impl PlanOptions {
    pub fn new(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            days_to_plan: 7,
            scope: PlanScope::FromNow,
            lock_in_progress: true,
        }
    }
}

// ==========================================
// Blocking issues & warnings
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockingIssueKind {
    NoPrinters,
    NoSettings,
    DeadlineImpossible,
    InsufficientMaterial,
    NoPreset,
}

impl BlockingIssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockingIssueKind::NoPrinters => "no_printers",
            BlockingIssueKind::NoSettings => "no_settings",
            BlockingIssueKind::DeadlineImpossible => "deadline_impossible",
            BlockingIssueKind::InsufficientMaterial => "insufficient_material",
            BlockingIssueKind::NoPreset => "no_preset",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingIssue {
    pub kind: BlockingIssueKind,
    pub project_id: Option<String>,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    MaterialLow,
    DeadlineRisk,
    CapacityUnused,
    PrinterOverload,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::MaterialLow => "material_low",
            WarningKind::DeadlineRisk => "deadline_risk",
            WarningKind::CapacityUnused => "capacity_unused",
            WarningKind::PrinterOverload => "printer_overload",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningSeverity {
    Info,
    Warn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanWarning {
    pub kind: WarningKind,
    pub severity: WarningSeverity,
    pub project_id: Option<String>,
    pub details: String,
}

// ==========================================
// PlanResult - engine output
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub cycles: Vec<PlannedCycle>,
    pub blocking_issues: Vec<BlockingIssue>,
    pub warnings: Vec<PlanWarning>,
    pub units_planned: i64,
    pub projects_planned: usize,
    pub log_summary: RunLogSummary,
}
