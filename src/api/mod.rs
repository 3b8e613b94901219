// ==========================================
// PrintFlow APS - API layer
// ==========================================
// The surface callers see: plan generation,
// recalculation, validation, capacity and impact
// queries, wired over the repositories and the
// remote mirror.
// ==========================================

pub mod plan_api;

pub use plan_api::PlanApi;
