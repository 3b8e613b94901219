// ==========================================
// PrintFlow APS - Product & plate preset models
// ==========================================
// A product is a catalog item; each product carries
// an ordered list of plate layouts (presets). One
// preset is marked recommended.
// ==========================================

use crate::domain::types::RiskLevel;
use serde::{Deserialize, Serialize};

// ==========================================
// PlatePreset - one plate layout
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatePreset {
    pub preset_id: String,            // preset ID
    pub product_id: String,           // owning product
    pub name: String,                 // display name ("full plate", "half plate"...)
    pub units_per_plate: i64,         // units produced by one cycle
    pub cycle_hours: f64,             // wall-clock hours for one cycle
    pub risk_level: RiskLevel,        // failure risk of this layout
    pub allowed_for_night_cycle: bool, // may run unattended
    pub recommended: bool,            // default layout for the product
    pub sort_order: i32,              // position in the product's preset list
}

// ==========================================
// Product - catalog item
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,        // product ID
    pub name: String,              // display name
    pub grams_per_unit: f64,       // filament weight of one unit
    pub presets: Vec<PlatePreset>, // ordered plate layouts, at least one
}

impl Product {
    /// The recommended preset, or the first one when nothing is marked.
    pub fn recommended_preset(&self) -> Option<&PlatePreset> {
        self.presets
            .iter()
            .find(|p| p.recommended)
            .or_else(|| self.presets.first())
    }

    /// Look up a preset by id within this product.
    pub fn preset_by_id(&self, preset_id: &str) -> Option<&PlatePreset> {
        self.presets.iter().find(|p| p.preset_id == preset_id)
    }
}
