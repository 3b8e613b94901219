// ==========================================
// PrintFlow APS - Core library
// ==========================================
// 3D-printing production scheduling: a deterministic
// planning engine over an SQLite store, with a
// best-effort remote mirror. Decision support - the
// operator keeps final control.
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities & types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Engine layer - planning rules
pub mod engine;

// Remote mirror - plan synchronization
pub mod sync;

// API layer - operations surface
pub mod api;

// Database infrastructure (connection init / PRAGMA / schema)
pub mod db;

// Logging
pub mod logging;

// ==========================================
// Core type re-exports
// ==========================================

pub use domain::types::{
    AfterHoursBehavior, CycleSource, CycleStatus, PlanScope, PlateType, ProjectStatus,
    ReadinessState, RiskLevel, ShiftKind, SpoolState, Urgency,
};

pub use domain::{
    ColorInventoryItem, FactorySettings, PlannedCycle, PlanningMeta, PlanningRunSummary,
    PlatePreset, Printer, Product, Project, Spool,
};

pub use engine::{
    CapacityCalculator, CapacityInfo, CycleScheduler, DeadlineImpactChecker, DryRunSimulator,
    MinimumPrinterSelector, PlanOptions, PlanResult, PlanningEngine, PlanningRepositories,
    PlateLimitPass, PresetSelector, PrinterScorer, Prioritizer, RecalcEngine, RecalculateResult,
    RunLog,
};

pub use api::PlanApi;

pub use sync::{InMemoryRemoteMirror, NoopRemoteMirror, RemoteMirror, SyncContext, SyncError};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "PrintFlow APS";
