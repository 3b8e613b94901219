// ==========================================
// PrintFlow APS - Engine layer
// ==========================================
// Business rules of the planner. Pure over snapshots:
// no SQL in here, every decision carries a reason,
// and the only writer is the recalculation engine.
// ==========================================

pub mod calendar;
pub mod capacity;
pub mod colors;
pub mod events;
pub mod feasibility;
pub mod impact;
pub mod legacy_fill;
pub mod material_view;
pub mod planner;
pub mod plate_limit;
pub mod preset_selector;
pub mod printer_scorer;
pub mod printer_selector;
pub mod prioritizer;
pub mod recalc;
pub mod repositories;
pub mod scheduler;
pub mod simulator;
pub mod slot;
pub mod snapshot;
pub mod validate;

pub use calendar::{Calendar, DayWindow};
pub use capacity::{CapacityCalculator, CapacityInfo};
pub use events::{BlockEvent, BlockReason, DecisionEvent, PrinterScoreRecord, RunLog};
pub use feasibility::FeasibilityValidator;
pub use impact::{DeadlineImpactChecker, DeadlineImpactResult, ProjectDraft};
pub use legacy_fill::LegacyFillScheduler;
pub use material_view::MaterialView;
pub use planner::PlanningEngine;
pub use plate_limit::PlateLimitPass;
pub use preset_selector::{PresetChoice, PresetSelector, SlotContext};
pub use printer_scorer::PrinterScorer;
pub use printer_selector::MinimumPrinterSelector;
pub use prioritizer::{Prioritizer, ProjectPlanningState};
pub use recalc::{RecalcEngine, RecalculateResult};
pub use repositories::PlanningRepositories;
pub use scheduler::CycleScheduler;
pub use simulator::{DryRunEstimate, DryRunSimulator};
pub use slot::PrinterSlot;
pub use snapshot::{
    BlockingIssue, BlockingIssueKind, PlanOptions, PlanResult, PlanWarning, PlanningSnapshot,
    WarningKind, WarningSeverity,
};
pub use validate::{PlanValidation, PlanValidator};
