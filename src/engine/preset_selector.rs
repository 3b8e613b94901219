// ==========================================
// PrintFlow APS - Plate preset selector
// ==========================================
// Scores a product's plate layouts against the slot
// being filled: remaining units, hours left in the
// slot, material on hand, night policy, and the
// pre-weekend window. Always returns a preset plus a
// human-readable reason.
// ==========================================

use crate::domain::product::{PlatePreset, Product};
use crate::domain::types::RiskLevel;
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

/// Thursday afternoon heading into the weekend: long cycles become
/// decisively more attractive because the plates loaded now are all
/// the factory produces until the next workday.
pub fn is_pre_weekend(t: NaiveDateTime) -> bool {
    t.weekday() == Weekday::Thu && t.hour() >= 14
}

// ==========================================
// PresetChoice
// ==========================================
#[derive(Debug, Clone)]
pub struct PresetChoice {
    pub preset: PlatePreset,
    pub reason: String,
}

// ==========================================
// SlotContext - constraints of the slot being filled
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct SlotContext {
    pub remaining_units: i64,
    pub available_hours: f64,
    pub available_grams: f64,
    pub night_slot: bool,
    pub pre_weekend: bool,
}

// ==========================================
// PresetSelector
// ==========================================
pub struct PresetSelector;

impl PresetSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn select(
        &self,
        product: &Product,
        ctx: SlotContext,
        preferred_preset_id: Option<&str>,
    ) -> Option<PresetChoice> {
        if product.presets.is_empty() {
            return None;
        }

        // 1. An explicit preference short-circuits scoring.
        if let Some(preferred_id) = preferred_preset_id {
            if let Some(preset) = product.preset_by_id(preferred_id) {
                return Some(PresetChoice {
                    preset: preset.clone(),
                    reason: "operator-preferred preset".to_string(),
                });
            }
        }

        // 2. Hard constraints.
        let candidates: Vec<&PlatePreset> = product
            .presets
            .iter()
            .filter(|p| {
                p.cycle_hours <= ctx.available_hours
                    && p.units_per_plate as f64 * product.grams_per_unit <= ctx.available_grams
                    && (!ctx.night_slot || p.allowed_for_night_cycle)
            })
            .collect();

        // 3. Nothing fits: fall back to the default layout.
        if candidates.is_empty() {
            let preset = product.recommended_preset()?;
            return Some(PresetChoice {
                preset: preset.clone(),
                reason: "no preset fits constraints; using default".to_string(),
            });
        }

        // 4. Weighted scoring.
        let max_units = candidates
            .iter()
            .map(|p| p.units_per_plate)
            .max()
            .unwrap_or(1)
            .max(1);
        let min_hours = candidates
            .iter()
            .map(|p| p.cycle_hours)
            .fold(f64::INFINITY, f64::min);
        let max_hours = candidates
            .iter()
            .map(|p| p.cycle_hours)
            .fold(0.0_f64, f64::max)
            .max(f64::EPSILON);

        let mut best: Option<(&PlatePreset, f64, Vec<String>)> = None;
        for preset in &candidates {
            let mut score = 0.0;
            let mut reasons: Vec<String> = Vec::new();

            let units_pts = 40.0 * preset.units_per_plate as f64 / max_units as f64;
            score += units_pts;
            reasons.push(format!("{} units/plate ({:.0}pts)", preset.units_per_plate, units_pts));

            let speed_pts = if preset.cycle_hours > 0.0 {
                20.0 * min_hours / preset.cycle_hours
            } else {
                20.0
            };
            score += speed_pts;
            reasons.push(format!("{:.1}h cycle ({:.0}pts)", preset.cycle_hours, speed_pts));

            let risk_pts = match preset.risk_level {
                RiskLevel::Low => 20.0,
                RiskLevel::Medium => 10.0,
                RiskLevel::High => 0.0,
            };
            score += risk_pts;
            reasons.push(format!("risk {} ({:.0}pts)", preset.risk_level, risk_pts));

            if preset.recommended {
                score += 20.0;
                reasons.push("recommended (+20)".to_string());
            }

            if preset.units_per_plate > ctx.remaining_units {
                let overshoot = (preset.units_per_plate - ctx.remaining_units) as f64;
                score -= 2.0 * overshoot;
                reasons.push(format!("overshoots remaining by {} (-{:.0})", overshoot, 2.0 * overshoot));
            }

            if ctx.available_hours < 4.0 && preset.cycle_hours > 0.8 * ctx.available_hours {
                score -= 10.0;
                reasons.push("tight slot (-10)".to_string());
            }

            if ctx.night_slot && preset.risk_level == RiskLevel::Low {
                score += 10.0;
                reasons.push("low-risk night cycle (+10)".to_string());
            }

            if ctx.pre_weekend {
                let weekend_pts = 100.0 * preset.cycle_hours / max_hours;
                score += weekend_pts;
                reasons.push(format!("pre-weekend long-cycle bonus (+{:.0})", weekend_pts));
            }

            let better = match &best {
                Some((_, best_score, _)) => score > *best_score,
                None => true,
            };
            if better {
                best = Some((preset, score, reasons));
            }
        }

        best.map(|(preset, score, reasons)| PresetChoice {
            preset: preset.clone(),
            reason: format!("score {:.0}: {}", score, reasons.join(", ")),
        })
    }
}

impl Default for PresetSelector {
    fn default() -> Self {
        Self::new()
    }
}
