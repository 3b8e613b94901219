// ==========================================
// PrintFlow APS - Spool & color inventory models
// ==========================================
// The color inventory table is authoritative for
// availability; individual spools are a secondary
// source and drive per-color concurrency caps.
// ==========================================

use crate::domain::types::SpoolState;
use serde::{Deserialize, Serialize};

// ==========================================
// Spool - one physical filament spool
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spool {
    pub spool_id: String,              // spool ID
    pub color: String,                 // filament color
    pub material: String,              // filament material (PLA, PETG, ...)
    pub package_grams: f64,            // nominal package size
    pub estimated_grams_remaining: f64, // best-effort remaining weight
    pub state: SpoolState,             // AVAILABLE / IN_USE / EMPTY
}

// ==========================================
// ColorInventoryItem - aggregate per (color, material)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorInventoryItem {
    pub color: String,            // filament color
    pub material: String,         // filament material
    pub closed_count: i64,        // unopened packages
    pub closed_spool_grams: f64,  // weight of one unopened package
    pub open_total_grams: f64,    // summed weight of opened spools
}

impl ColorInventoryItem {
    /// Total grams this inventory row represents.
    pub fn total_grams(&self) -> f64 {
        self.closed_count as f64 * self.closed_spool_grams + self.open_total_grams
    }
}
