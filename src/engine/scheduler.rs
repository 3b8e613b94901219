// ==========================================
// PrintFlow APS - Cycle scheduler
// ==========================================
// Places real cycles for the prioritized project
// queue. Each project first picks its minimum printer
// set, then cycles land on those slots through the
// same earliest-available heap the simulator uses,
// this time mutating the shared slot pool so later
// projects see the true timeline.
// ==========================================

use crate::domain::cycle::PlannedCycle;
use crate::domain::settings::FactorySettings;
use crate::domain::types::{CycleStatus, PlateType, ReadinessState};
use crate::engine::calendar::Calendar;
use crate::engine::colors::normalize_color;
use crate::engine::events::{BlockEvent, BlockReason, RunLog};
use crate::engine::material_view::MaterialView;
use crate::engine::preset_selector::{is_pre_weekend, PresetSelector, SlotContext};
use crate::engine::printer_selector::MinimumPrinterSelector;
use crate::engine::prioritizer::ProjectPlanningState;
use crate::engine::slot::{GateDecision, PrinterSlot, SlotPhase};
use chrono::{Duration, NaiveDateTime};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use uuid::Uuid;

/// Safety cap on the per-project placement loop; degenerate inputs log
/// a warning instead of spinning.
pub const MAX_PLACEMENT_ITERATIONS: usize = 1000;

/// How many spools a waiting cycle suggests at most.
const SUGGESTED_SPOOL_LIMIT: usize = 3;

// ==========================================
// PlaceAttempt - outcome of one placement try
// ==========================================
#[derive(Debug)]
pub enum PlaceAttempt {
    /// A cycle was committed to the slot.
    Placed { cycle: PlannedCycle, units: i64 },
    /// The slot cannot take this cycle today; caller advances it.
    Advance { reason: BlockReason, details: String },
    /// The product has no presets at all; caller drops the project.
    NoPreset,
}

// ==========================================
// CyclePlacer - shared per-cycle mechanics
// ==========================================
// Used by both the project-centric scheduler and the
// legacy fill-printer-first pass: preset choice for
// the slot at hand, gate evaluation, readiness, spool
// caps and the per-run material budget.
pub struct CyclePlacer<'a> {
    material: &'a MaterialView,
    preset_selector: PresetSelector,
    /// Per-run material budget, decremented by every placed cycle.
    grams_left: HashMap<String, f64>,
    /// Which printers currently hold which color.
    color_holders: HashMap<String, HashSet<String>>,
}

impl<'a> CyclePlacer<'a> {
    pub fn new(material: &'a MaterialView, slots: &[PrinterSlot]) -> Self {
        let mut color_holders: HashMap<String, HashSet<String>> = HashMap::new();
        for slot in slots {
            if let Some(color) = slot.last_scheduled_color.as_deref() {
                color_holders
                    .entry(color.to_string())
                    .or_default()
                    .insert(slot.printer.printer_id.clone());
            }
        }
        Self {
            material,
            preset_selector: PresetSelector::new(),
            grams_left: HashMap::new(),
            color_holders,
        }
    }

    /// Try to place one cycle of `state` on `slot` at its current
    /// time. On success the slot is mutated and the cycle returned.
    pub fn attempt(
        &mut self,
        state: &ProjectPlanningState,
        remaining: i64,
        slot: &mut PrinterSlot,
        calendar: &Calendar,
        settings: &FactorySettings,
        log: &mut RunLog,
    ) -> PlaceAttempt {
        let color = normalize_color(&state.project.color);
        let budget_grams = match self.grams_left.get(&color) {
            Some(grams) => *grams,
            None => {
                let grams = self.material.available_grams(&color);
                self.grams_left.insert(color.clone(), grams);
                grams
            }
        };

        // Pick the plate layout for this particular slot.
        let night_slot = slot.phase(calendar, settings) == SlotPhase::InNightExtension;
        let slot_hours_left =
            ((slot.end_of_day - slot.current_time).num_minutes() as f64 / 60.0).max(0.0);
        let choice = match self.preset_selector.select(
            &state.product,
            SlotContext {
                remaining_units: remaining,
                available_hours: slot_hours_left,
                available_grams: budget_grams,
                night_slot,
                pre_weekend: is_pre_weekend(slot.current_time),
            },
            state.project.preferred_preset_id.as_deref(),
        ) {
            Some(choice) => choice,
            None => return PlaceAttempt::NoPreset,
        };
        let preset = &choice.preset;

        let cycle_hours = state
            .project
            .custom_cycle_hours
            .filter(|h| *h > 0.0)
            .unwrap_or(preset.cycle_hours);
        let cycle_minutes = (cycle_hours * 60.0).round() as i64;

        let (shift, night_start) =
            match slot.evaluate_start(preset, &state.project.color, calendar, settings) {
                GateDecision::Start { shift, night_start } => (shift, night_start),
                GateDecision::Advance { reason, details } => {
                    return PlaceAttempt::Advance { reason, details }
                }
            };

        let units = preset.units_per_plate.min(remaining);
        let start_time = slot.current_time;
        let end_time = start_time + Duration::minutes(cycle_minutes);
        let required_grams = units as f64 * state.product.grams_per_unit;

        let plate_type = if units == preset.units_per_plate {
            PlateType::Full
        } else if remaining <= units {
            PlateType::Closeout
        } else {
            PlateType::Reduced
        };

        // Spool-cap bookkeeping: a printer newly picking up this color
        // must not exceed the physical spool count. Violations are
        // logged, not hard-blocked; the cycle waits for a spool.
        let holders = self.color_holders.entry(color.clone()).or_default();
        let newly_holding = !holders.contains(&slot.printer.printer_id);
        let spool_cap = self.material.physical_spool_count(&color);
        let cap_violated = newly_holding && (holders.len() as i64) >= spool_cap;
        if cap_violated {
            log.record_block(BlockEvent {
                reason: BlockReason::InsufficientMaterial,
                project_id: Some(state.project.project_id.clone()),
                printer_id: Some(slot.printer.printer_id.clone()),
                preset_id: Some(preset.preset_id.clone()),
                details: format!(
                    "color '{}' already active on {} printer(s), only {} spool(s) exist",
                    color,
                    holders.len(),
                    spool_cap
                ),
                scheduled_date: Some(start_time.date()),
                cycle_hours: Some(cycle_hours),
            });
        }
        holders.insert(slot.printer.printer_id.clone());

        // Readiness: inventory first, then mounted color.
        let (readiness, details, suggested) = if budget_grams < required_grams {
            (
                ReadinessState::BlockedInventory,
                Some(format!(
                    "needs {:.0}g of '{}', only {:.0}g left in inventory",
                    required_grams, color, budget_grams
                )),
                Vec::new(),
            )
        } else if cap_violated {
            (
                ReadinessState::WaitingForSpool,
                Some(format!(
                    "no free '{}' spool; one must be moved from another printer",
                    color
                )),
                self.material
                    .suggest_spools(&color, required_grams, SUGGESTED_SPOOL_LIMIT),
            )
        } else if Self::color_mounted(slot, &color) {
            (ReadinessState::Ready, None, Vec::new())
        } else {
            (
                ReadinessState::WaitingForSpool,
                Some(format!(
                    "load a '{}' spool with at least {:.0}g",
                    color, required_grams
                )),
                self.material
                    .suggest_spools(&color, required_grams, SUGGESTED_SPOOL_LIMIT),
            )
        };
        if let Some(budget) = self.grams_left.get_mut(&color) {
            *budget -= required_grams;
        }

        let (plate_index, plate_release_time) = slot.commit_cycle(
            end_time,
            shift,
            night_start,
            &state.project.color,
            &state.project.project_id,
            settings,
        );

        tracing::debug!(
            project_id = %state.project.project_id,
            printer_id = %slot.printer.printer_id,
            start = %start_time,
            units,
            readiness = %readiness,
            "cycle placed"
        );

        let cycle = PlannedCycle {
            cycle_id: Uuid::new_v4().to_string(),
            project_id: state.project.project_id.clone(),
            printer_id: slot.printer.printer_id.clone(),
            units_planned: units,
            grams_planned: required_grams,
            plate_type,
            start_time,
            end_time,
            shift,
            status: CycleStatus::Planned,
            readiness_state: readiness,
            readiness_details: details,
            required_color: color,
            required_grams,
            suggested_spool_ids: suggested,
            preset_id: preset.preset_id.clone(),
            preset_reason: Some(choice.reason),
            plate_index,
            plate_release_time,
            source: crate::domain::types::CycleSource::Auto,
            locked: false,
        };

        PlaceAttempt::Placed { cycle, units }
    }

    /// The required color already sits on the printer: either the slot
    /// scheduled it last, or the hardware reports it mounted.
    fn color_mounted(slot: &PrinterSlot, color: &str) -> bool {
        if slot.last_scheduled_color.as_deref() == Some(color) {
            return true;
        }
        slot.printer
            .mounted_colors()
            .iter()
            .any(|mounted| normalize_color(mounted) == color)
    }
}

pub(crate) fn no_workday_event(state: &ProjectPlanningState, slot: &PrinterSlot) -> BlockEvent {
    BlockEvent {
        reason: BlockReason::NoWorkdayWithinHorizon,
        project_id: Some(state.project.project_id.clone()),
        printer_id: Some(slot.printer.printer_id.clone()),
        preset_id: None,
        details: "no enabled workday within the scan bound".to_string(),
        scheduled_date: Some(slot.current_time.date()),
        cycle_hours: None,
    }
}

// ==========================================
// CycleScheduler - project-centric placement
// ==========================================
pub struct CycleScheduler {
    selector: MinimumPrinterSelector,
}

impl CycleScheduler {
    pub fn new() -> Self {
        Self {
            selector: MinimumPrinterSelector::new(),
        }
    }

    /// Place cycles for every prioritized project, in order. `slots`
    /// is the shared pool; it carries state (time, colors, plates)
    /// from one project to the next.
    #[allow(clippy::too_many_arguments)]
    pub fn schedule(
        &self,
        states: &[ProjectPlanningState],
        slots: &mut [PrinterSlot],
        material: &MaterialView,
        calendar: &Calendar,
        settings: &FactorySettings,
        now: NaiveDateTime,
        horizon_end: NaiveDateTime,
        log: &mut RunLog,
    ) -> Vec<PlannedCycle> {
        let mut cycles: Vec<PlannedCycle> = Vec::new();
        let mut placer = CyclePlacer::new(material, slots);

        for state in states {
            let selection = self
                .selector
                .select(slots, state, calendar, settings, now, log);
            if selection.slot_indices.is_empty() {
                continue;
            }

            tracing::info!(
                project_id = %state.project.project_id,
                printers = selection.slot_indices.len(),
                remaining_units = state.remaining_units,
                meets_deadline = selection.estimate.meets_deadline,
                "placing project"
            );

            self.place_project(
                state,
                &selection.slot_indices,
                slots,
                &mut placer,
                calendar,
                settings,
                horizon_end,
                log,
                &mut cycles,
            );
        }

        cycles
    }

    #[allow(clippy::too_many_arguments)]
    fn place_project(
        &self,
        state: &ProjectPlanningState,
        chosen: &[usize],
        slots: &mut [PrinterSlot],
        placer: &mut CyclePlacer<'_>,
        calendar: &Calendar,
        settings: &FactorySettings,
        horizon_end: NaiveDateTime,
        log: &mut RunLog,
        cycles: &mut Vec<PlannedCycle>,
    ) {
        let mut heap: BinaryHeap<Reverse<(NaiveDateTime, usize, usize)>> = BinaryHeap::new();
        for idx in chosen {
            heap.push(Reverse((slots[*idx].current_time, slots[*idx].order, *idx)));
        }

        let mut remaining = state.remaining_units;
        let mut iterations = 0usize;

        while remaining > 0 {
            iterations += 1;
            if iterations > MAX_PLACEMENT_ITERATIONS {
                tracing::warn!(
                    project_id = %state.project.project_id,
                    remaining_units = remaining,
                    "placement iteration cap reached; leaving project partially planned"
                );
                break;
            }

            let Some(Reverse((_, _, idx))) = heap.pop() else {
                break;
            };
            let slot = &mut slots[idx];
            if slot.current_time >= horizon_end {
                continue; // beyond the planning window; slot retired for this project
            }

            slot.release_plates(calendar);
            if !slot.has_free_plate() {
                log.record_block(BlockEvent {
                    reason: BlockReason::PlatesLimit,
                    project_id: Some(state.project.project_id.clone()),
                    printer_id: Some(slot.printer.printer_id.clone()),
                    preset_id: None,
                    details: "all physical plates occupied".to_string(),
                    scheduled_date: Some(slot.current_time.date()),
                    cycle_hours: None,
                });
                if slot.advance_to_next_workday(calendar, settings) {
                    heap.push(Reverse((slot.current_time, slot.order, idx)));
                } else {
                    log.record_block(no_workday_event(state, slot));
                }
                continue;
            }

            match placer.attempt(state, remaining, slot, calendar, settings, log) {
                PlaceAttempt::Placed { cycle, units } => {
                    cycles.push(cycle);
                    remaining -= units;
                    heap.push(Reverse((slot.current_time, slot.order, idx)));
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
                    if slot.advance_to_next_workday(calendar, settings) {
                        heap.push(Reverse((slot.current_time, slot.order, idx)));
                    } else {
                        log.record_block(no_workday_event(state, slot));
                    }
                }
                PlaceAttempt::NoPreset => {
                    tracing::warn!(
                        project_id = %state.project.project_id,
                        "no preset available at placement time"
                    );
                    break;
                }
            }
        }
    }
}

impl Default for CycleScheduler {
    fn default() -> Self {
        Self::new()
    }
}
