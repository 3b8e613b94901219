// ==========================================
// PrintFlow APS - Legacy fill-printer-first pass
// ==========================================
// The pre-project-centric algorithm, kept behind the
// planner toggle: walk printers in listed order and
// fill each one's timeline with work from the
// priority queue before touching the next printer.
// Shares all per-cycle mechanics (presets, gates,
// readiness, plate accounting) with the scheduler.
// ==========================================

use crate::domain::cycle::PlannedCycle;
use crate::domain::settings::FactorySettings;
use crate::engine::calendar::Calendar;
use crate::engine::events::{BlockEvent, RunLog};
use crate::engine::material_view::MaterialView;
use crate::engine::prioritizer::ProjectPlanningState;
use crate::engine::scheduler::{no_workday_event, CyclePlacer, PlaceAttempt, MAX_PLACEMENT_ITERATIONS};
use crate::engine::slot::PrinterSlot;
use chrono::NaiveDateTime;

// ==========================================
// LegacyFillScheduler
// ==========================================
pub struct LegacyFillScheduler;

impl LegacyFillScheduler {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn schedule(
        &self,
        states: &[ProjectPlanningState],
        slots: &mut [PrinterSlot],
        material: &MaterialView,
        calendar: &Calendar,
        settings: &FactorySettings,
        horizon_end: NaiveDateTime,
        log: &mut RunLog,
    ) -> Vec<PlannedCycle> {
        let mut cycles: Vec<PlannedCycle> = Vec::new();
        let mut placer = CyclePlacer::new(material, slots);

        // Remaining units per queue position; consumed front-first.
        let mut remaining: Vec<i64> = states.iter().map(|s| s.remaining_units).collect();

        for slot_idx in 0..slots.len() {
            let slot = &mut slots[slot_idx];
            let mut iterations = 0usize;

            'printer: loop {
                iterations += 1;
                if iterations > MAX_PLACEMENT_ITERATIONS {
                    tracing::warn!(
                        printer_id = %slot.printer.printer_id,
                        "fill iteration cap reached; moving to next printer"
                    );
                    break;
                }
                if slot.current_time >= horizon_end {
                    break;
                }

                let open_positions: Vec<usize> = remaining
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| **r > 0)
                    .map(|(pos, _)| pos)
                    .collect();
                if open_positions.is_empty() {
                    break;
                }

                slot.release_plates(calendar);
                if !slot.has_free_plate() {
                    if !slot.advance_to_next_workday(calendar, settings) {
                        log.record_block(no_workday_event(&states[open_positions[0]], slot));
                        break;
                    }
                    continue;
                }

                // Try projects in priority order at this slot time; a
                // project blocked here (night color lock, no night
                // preset) does not stop a later one from fitting.
                let mut placed = false;
                for queue_pos in open_positions {
                    let state = &states[queue_pos];
                    match placer.attempt(state, remaining[queue_pos], slot, calendar, settings, log)
                    {
                        PlaceAttempt::Placed { cycle, units } => {
                            cycles.push(cycle);
                            remaining[queue_pos] -= units;
                            placed = true;
                            break;
                        }
                        PlaceAttempt::Advance { reason, details } => {
                            log.record_block(BlockEvent {
                                reason,
                                project_id: Some(state.project.project_id.clone()),
                                printer_id: Some(slot.printer.printer_id.clone()),
                                preset_id: None,
                                details,
                                scheduled_date: Some(slot.current_time.date()),
                                cycle_hours: None,
                            });
                        }
                        PlaceAttempt::NoPreset => {
                            // Retire this project from the queue entirely.
                            remaining[queue_pos] = 0;
                        }
                    }
                }

                if !placed {
                    if !slot.advance_to_next_workday(calendar, settings) {
                        break 'printer;
                    }
                }
            }
        }

        cycles
    }
}

impl Default for LegacyFillScheduler {
    fn default() -> Self {
        Self::new()
    }
}
