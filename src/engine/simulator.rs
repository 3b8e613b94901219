// ==========================================
// PrintFlow APS - Dry-run simulator
// ==========================================
// Estimates when a candidate printer set would finish
// a project, using the same heap discipline as the
// real scheduler but on deep-cloned slots. Bounded by
// a 30-day simulation horizon.
// ==========================================

use crate::domain::settings::FactorySettings;
use crate::engine::calendar::Calendar;
use crate::engine::prioritizer::ProjectPlanningState;
use crate::engine::slot::{GateDecision, PrinterSlot};
use chrono::{Duration, NaiveDateTime};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Simulation never looks further out than this.
pub const SIMULATION_HORIZON_DAYS: i64 = 30;

// ==========================================
// DryRunEstimate
// ==========================================
#[derive(Debug, Clone)]
pub struct DryRunEstimate {
    pub finish_time: Option<NaiveDateTime>,
    pub cycle_count: i64,
    pub meets_deadline: bool,
    pub margin_hours: f64,
}

// ==========================================
// DryRunSimulator
// ==========================================
pub struct DryRunSimulator;

impl DryRunSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Simulate placing `state`'s remaining units across `slots`. The
    /// caller's slots are untouched; everything here works on clones.
    pub fn estimate(
        &self,
        slots: &[PrinterSlot],
        state: &ProjectPlanningState,
        calendar: &Calendar,
        settings: &FactorySettings,
        now: NaiveDateTime,
    ) -> DryRunEstimate {
        let mut sim_slots: Vec<PrinterSlot> = slots.to_vec();
        let horizon = now + Duration::days(SIMULATION_HORIZON_DAYS);
        // Deadline instant: midnight opening the due date. Work must be
        // done before the due date begins, which also makes a due date
        // of today immediately impossible.
        let deadline = state
            .project
            .due_date
            .and_hms_opt(0, 0, 0)
            .expect("valid midnight");

        let mut heap: BinaryHeap<Reverse<(NaiveDateTime, usize, usize)>> = BinaryHeap::new();
        for (idx, slot) in sim_slots.iter().enumerate() {
            heap.push(Reverse((slot.current_time, slot.order, idx)));
        }

        let cycle_minutes = (Self::effective_cycle_hours(state) * 60.0).round() as i64;
        let mut remaining = state.remaining_units;
        let mut cycle_count: i64 = 0;
        let mut finish_time: Option<NaiveDateTime> = None;

        while remaining > 0 {
            let Some(Reverse((_, _, idx))) = heap.pop() else {
                break;
            };
            let slot = &mut sim_slots[idx];
            if slot.current_time > horizon {
                continue; // slot dropped, horizon exceeded
            }

            slot.release_plates(calendar);
            if !slot.has_free_plate() {
                if slot.advance_to_next_workday(calendar, settings) {
                    heap.push(Reverse((slot.current_time, slot.order, idx)));
                }
                continue;
            }

            match slot.evaluate_start(&state.preset, &state.project.color, calendar, settings) {
                GateDecision::Start {
                    shift, night_start, ..
                } => {
                    let units = state.preset.units_per_plate.min(remaining);
                    let cycle_end = slot.current_time + Duration::minutes(cycle_minutes);
                    slot.commit_cycle(
                        cycle_end,
                        shift,
                        night_start,
                        &state.project.color,
                        &state.project.project_id,
                        settings,
                    );
                    remaining -= units;
                    cycle_count += 1;
                    finish_time = Some(cycle_end);
                    heap.push(Reverse((slot.current_time, slot.order, idx)));
                }
                GateDecision::Advance { .. } => {
                    if slot.advance_to_next_workday(calendar, settings) {
                        heap.push(Reverse((slot.current_time, slot.order, idx)));
                    }
                }
            }
        }

        let meets_deadline = remaining <= 0
            && finish_time.map(|f| f <= deadline).unwrap_or(false);
        let margin_hours = match finish_time {
            Some(f) if remaining <= 0 => (deadline - f).num_minutes() as f64 / 60.0,
            _ => -(SIMULATION_HORIZON_DAYS as f64 * 24.0),
        };

        DryRunEstimate {
            finish_time,
            cycle_count,
            meets_deadline,
            margin_hours,
        }
    }

    /// A project-level override replaces the preset cycle length.
    fn effective_cycle_hours(state: &ProjectPlanningState) -> f64 {
        state
            .project
            .custom_cycle_hours
            .filter(|h| *h > 0.0)
            .unwrap_or(state.preset.cycle_hours)
    }
}

impl Default for DryRunSimulator {
    fn default() -> Self {
        Self::new()
    }
}
