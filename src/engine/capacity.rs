// ==========================================
// PrintFlow APS - Week capacity calculator
// ==========================================
// Aggregate view of the week ahead: hours the
// calendar offers across the fleet, hours the plan
// already claims, and a rough unit throughput bound.
// ==========================================

use crate::engine::calendar::Calendar;
use crate::engine::snapshot::PlanningSnapshot;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

// ==========================================
// CapacityInfo
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityInfo {
    pub start_date: NaiveDate,
    pub days: i64,
    pub total_available_hours: f64,
    pub scheduled_hours: f64,
    pub utilization_pct: f64,
    /// Units the fleet could produce in the free hours, using the
    /// average throughput of the catalog's recommended presets.
    pub estimated_units_capacity: i64,
}

// ==========================================
// CapacityCalculator
// ==========================================
pub struct CapacityCalculator;

impl CapacityCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn week_capacity(&self, snapshot: &PlanningSnapshot, start_date: NaiveDate) -> CapacityInfo {
        let days = 7i64;
        let calendar = Calendar::new(snapshot.settings.weekly_schedule.clone());
        let printer_count = snapshot.printers.iter().filter(|p| p.active).count() as f64;

        let total_available_hours =
            calendar.working_hours_in_range(start_date, days) * printer_count;

        let window_start = start_date.and_hms_opt(0, 0, 0).expect("valid midnight");
        let window_end = window_start + Duration::days(days);
        let scheduled_hours: f64 = snapshot
            .existing_cycles
            .iter()
            .filter(|c| !c.status.is_terminal())
            .filter(|c| c.start_time >= window_start && c.start_time < window_end)
            .map(|c| (c.end_time - c.start_time).num_minutes() as f64 / 60.0)
            .sum();

        let utilization_pct = if total_available_hours > 0.0 {
            (scheduled_hours / total_available_hours * 100.0).min(100.0)
        } else {
            0.0
        };

        // Average units/hour over recommended presets.
        let mut throughputs: Vec<f64> = Vec::new();
        for product in &snapshot.products {
            if let Some(preset) = product.recommended_preset() {
                if preset.cycle_hours > 0.0 {
                    throughputs.push(preset.units_per_plate as f64 / preset.cycle_hours);
                }
            }
        }
        let estimated_units_capacity = if throughputs.is_empty() {
            0
        } else {
            let avg = throughputs.iter().sum::<f64>() / throughputs.len() as f64;
            ((total_available_hours - scheduled_hours).max(0.0) * avg).floor() as i64
        };

        CapacityInfo {
            start_date,
            days,
            total_available_hours,
            scheduled_hours,
            utilization_pct,
            estimated_units_capacity,
        }
    }
}

impl Default for CapacityCalculator {
    fn default() -> Self {
        Self::new()
    }
}
