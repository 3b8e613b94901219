// ==========================================
// PrintFlow APS - Printer scheduling slot
// ==========================================
// Per-printer timeline state used by both the dry-run
// simulator and the real scheduler. A slot walks one
// day at a time through three phases:
//
//   InWork --(past end of work, no autonomy)--> ExhaustedForDay
//   InWork --(past end of work, gates open)---> InNightExtension
//   InNightExtension --(no preloaded plates)--> ExhaustedForDay
//   InNightExtension --(past end of day)------> ExhaustedForDay
//   ExhaustedForDay --(next workday start)----> InWork
//
// Plates recycle 10 minutes after a cycle ends, but
// only while an operator is present; everything else
// waits for the next workday start.
// ==========================================

use crate::domain::printer::Printer;
use crate::domain::product::PlatePreset;
use crate::domain::settings::FactorySettings;
use crate::domain::types::{AfterHoursBehavior, ShiftKind};
use crate::engine::calendar::{Calendar, DayWindow};
use crate::engine::colors::normalize_color;
use crate::engine::events::BlockReason;
use chrono::{Duration, NaiveDateTime};

/// Minutes a plate stays occupied after its cycle ends.
pub const PLATE_RELEASE_MINUTES: i64 = 10;

/// Plates an operator pre-loads at shift close for the night window.
pub const END_OF_DAY_PRELOAD_PLATES: i64 = 5;

// ==========================================
// SlotPhase
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPhase {
    InWork,
    InNightExtension,
    ExhaustedForDay,
}

// ==========================================
// GateDecision - can a cycle start here, now?
// ==========================================
#[derive(Debug, Clone)]
pub enum GateDecision {
    /// Start the cycle with the given shift tag.
    Start { shift: ShiftKind, night_start: bool },
    /// This slot cannot take the cycle today; advance to the next
    /// workday and record why.
    Advance {
        reason: BlockReason,
        details: String,
    },
}

// ==========================================
// PrinterSlot
// ==========================================
#[derive(Debug, Clone)]
pub struct PrinterSlot {
    pub printer: Printer,
    /// Insertion order; breaks heap ties so runs are deterministic.
    pub order: usize,
    pub current_time: NaiveDateTime,
    /// Resolved work window of the slot's current day, when one exists.
    pub day: Option<DayWindow>,
    /// End of the night-extension window (next workday start under
    /// FULL_AUTOMATION, otherwise the work window end).
    pub end_of_day: NaiveDateTime,
    /// Release times of plates currently occupied.
    pub plates_in_use: Vec<NaiveDateTime>,
    /// Plates granted at shift close, consumed one per night cycle.
    pub preloaded_plates: i64,
    /// Whether the preload grant for the current night was issued.
    pub night_grant_issued: bool,
    /// ONE_CYCLE_END_OF_DAY: the single allowed crossing cycle.
    pub end_of_day_cycle_used: bool,
    pub last_scheduled_color: Option<String>, // normalized
    pub last_project_id: Option<String>,
}

impl PrinterSlot {
    /// Build a slot positioned at the printer's first free instant at
    /// or after `start`. Preserved cycles (in-flight, locked manual)
    /// push the slot forward; the plan flows around them.
    pub fn new(
        printer: Printer,
        order: usize,
        start: NaiveDateTime,
        preserved_end: Option<NaiveDateTime>,
        calendar: &Calendar,
        settings: &FactorySettings,
    ) -> Self {
        let transition = Duration::minutes(settings.transition_minutes);
        let effective_start = match preserved_end {
            Some(busy_until) if busy_until + transition > start => busy_until + transition,
            _ => start,
        };
        let last_color = printer.mounted_color.as_deref().map(normalize_color);
        let mut slot = Self {
            printer,
            order,
            current_time: effective_start,
            day: None,
            end_of_day: effective_start,
            plates_in_use: Vec::new(),
            preloaded_plates: 0,
            night_grant_issued: false,
            end_of_day_cycle_used: false,
            last_scheduled_color: last_color,
            last_project_id: None,
        };
        slot.rebuild_day_bounds(calendar, settings);
        slot
    }

    /// Recompute the day window and end-of-day horizon around
    /// `current_time`.
    pub fn rebuild_day_bounds(&mut self, calendar: &Calendar, settings: &FactorySettings) {
        self.day = calendar.window_containing(self.current_time).or_else(|| {
            // Not inside a window: the relevant day is the most recent
            // one whose night extension we may still be in.
            calendar.schedule_for(self.current_time.date()).filter(|w| w.end <= self.current_time)
        });

        let night_until = calendar
            .advance_to_next_workday_start(self.current_time)
            .unwrap_or(self.current_time);

        self.end_of_day = match settings.after_hours_behavior {
            AfterHoursBehavior::FullAutomation => night_until.max(self.current_time),
            _ => match self.day {
                Some(window) => window.end,
                None => self.current_time,
            },
        };
    }

    /// Where the slot stands right now in the day state machine.
    pub fn phase(&self, calendar: &Calendar, settings: &FactorySettings) -> SlotPhase {
        if calendar.is_operator_present(self.current_time) {
            return SlotPhase::InWork;
        }
        if settings.after_hours_behavior == AfterHoursBehavior::FullAutomation
            && self.current_time < self.end_of_day
        {
            return SlotPhase::InNightExtension;
        }
        SlotPhase::ExhaustedForDay
    }

    /// Release plates an operator has had a chance to clear: either the
    /// release instant fell inside a work window, or a workday start
    /// has passed since. Plates finishing after hours otherwise wait.
    pub fn release_plates(&mut self, calendar: &Calendar) {
        let now = self.current_time;
        self.plates_in_use.retain(|release| {
            if *release > now {
                return true;
            }
            match calendar.next_operator_time(*release) {
                Some(cleared_at) => cleared_at > now,
                None => true,
            }
        });
    }

    pub fn plates_occupied(&self) -> i64 {
        self.plates_in_use.len() as i64
    }

    pub fn has_free_plate(&self) -> bool {
        self.plates_occupied() < self.printer.plate_capacity()
    }

    /// Move the slot to the next workday start: plates cleared by the
    /// arriving operator, night bookkeeping reset. Returns false when
    /// no workday exists within the scan bound.
    pub fn advance_to_next_workday(
        &mut self,
        calendar: &Calendar,
        settings: &FactorySettings,
    ) -> bool {
        let Some(next_start) = calendar.advance_to_next_workday_start(self.current_time) else {
            return false;
        };
        self.current_time = next_start;
        self.plates_in_use.clear();
        self.preloaded_plates = 0;
        self.night_grant_issued = false;
        self.end_of_day_cycle_used = false;
        self.rebuild_day_bounds(calendar, settings);
        true
    }

    /// Grant the end-of-day preload exactly once per night window, and
    /// only when shift close happened on a working day (an operator was
    /// there to clear the bed stack and load fresh plates). Autonomous
    /// days grant nothing.
    fn ensure_night_grant(&mut self, calendar: &Calendar) {
        if self.night_grant_issued {
            return;
        }
        self.night_grant_issued = true;
        // The grant exists iff the night follows a work window.
        let came_from_workday = self
            .day
            .map(|w| w.end <= self.current_time)
            .unwrap_or(false)
            || calendar
                .window_containing(self.current_time - Duration::minutes(1))
                .is_some();
        if came_from_workday {
            self.preloaded_plates = END_OF_DAY_PRELOAD_PLATES;
            // Shift close: the operator also cleared the day's plates.
            self.plates_in_use.clear();
        } else {
            self.preloaded_plates = 0;
        }
    }

    /// Full gate check for starting `preset` at `current_time` in
    /// `color`. Mirrors the day state machine above.
    pub fn evaluate_start(
        &mut self,
        preset: &PlatePreset,
        color: &str,
        calendar: &Calendar,
        settings: &FactorySettings,
    ) -> GateDecision {
        let cycle_hours_min = (preset.cycle_hours * 60.0).round() as i64;
        let cycle_end = self.current_time + Duration::minutes(cycle_hours_min);

        match self.phase(calendar, settings) {
            SlotPhase::InWork => {
                let Some(window) = calendar.window_containing(self.current_time) else {
                    return GateDecision::Advance {
                        reason: BlockReason::AfterHoursPolicy,
                        details: "no work window covers this instant".to_string(),
                    };
                };
                if cycle_end <= window.end {
                    return GateDecision::Start {
                        shift: ShiftKind::Day,
                        night_start: false,
                    };
                }
                // The cycle crosses end-of-work: secondary night check.
                match settings.after_hours_behavior {
                    AfterHoursBehavior::FullAutomation => {
                        if !self.printer.can_start_new_cycles_after_hours {
                            GateDecision::Advance {
                                reason: BlockReason::AfterHoursPolicy,
                                details: "printer may not run past end of work".to_string(),
                            }
                        } else if !preset.allowed_for_night_cycle {
                            GateDecision::Advance {
                                reason: BlockReason::NoNightPreset,
                                details: "preset not approved for night cycles".to_string(),
                            }
                        } else {
                            GateDecision::Start {
                                shift: ShiftKind::Day,
                                night_start: false,
                            }
                        }
                    }
                    AfterHoursBehavior::OneCycleEndOfDay => {
                        if self.end_of_day_cycle_used {
                            GateDecision::Advance {
                                reason: BlockReason::AfterHoursPolicy,
                                details: "end-of-day cycle already used".to_string(),
                            }
                        } else {
                            GateDecision::Start {
                                shift: ShiftKind::EndOfDay,
                                night_start: false,
                            }
                        }
                    }
                    AfterHoursBehavior::None => GateDecision::Advance {
                        reason: BlockReason::AfterHoursPolicy,
                        details: "cycle would cross end of work".to_string(),
                    },
                }
            }
            SlotPhase::InNightExtension => {
                // FULL_AUTOMATION only; the policy gate is implied by
                // the phase, the printer and preset gates are not.
                if !self.printer.can_start_new_cycles_after_hours {
                    return GateDecision::Advance {
                        reason: BlockReason::AfterHoursPolicy,
                        details: "printer may not start cycles after hours".to_string(),
                    };
                }
                if !preset.allowed_for_night_cycle {
                    return GateDecision::Advance {
                        reason: BlockReason::NoNightPreset,
                        details: "preset not approved for night cycles".to_string(),
                    };
                }
                if cycle_end > self.end_of_day {
                    return GateDecision::Advance {
                        reason: BlockReason::AfterHoursPolicy,
                        details: "cycle would outlast the night window".to_string(),
                    };
                }
                self.ensure_night_grant(calendar);
                if self.preloaded_plates <= 0 {
                    return GateDecision::Advance {
                        reason: BlockReason::PlatesLimit,
                        details: "no pre-loaded plates left for the night".to_string(),
                    };
                }
                // A non-AMS printer cannot swap spools unattended.
                if !self.printer.has_ams {
                    if let Some(locked) = self.last_scheduled_color.as_deref() {
                        if locked != normalize_color(color) {
                            return GateDecision::Advance {
                                reason: BlockReason::ColorLockNight,
                                details: format!(
                                    "printer locked to '{}' overnight, project needs '{}'",
                                    locked,
                                    normalize_color(color)
                                ),
                            };
                        }
                    }
                }
                GateDecision::Start {
                    shift: ShiftKind::EndOfDay,
                    night_start: true,
                }
            }
            SlotPhase::ExhaustedForDay => GateDecision::Advance {
                reason: BlockReason::AfterHoursPolicy,
                details: "slot exhausted for the day".to_string(),
            },
        }
    }

    /// Commit a cycle start: plate bookkeeping and color/continuity
    /// tracking. Returns the plate index (1-based within the day).
    ///
    /// Night cycles consume the pre-loaded stack instead of the
    /// recyclable day plates; the physical-capacity consequence is
    /// handled by the plate post-pass, not here.
    pub fn commit_cycle(
        &mut self,
        cycle_end: NaiveDateTime,
        shift: ShiftKind,
        night_start: bool,
        color: &str,
        project_id: &str,
        settings: &FactorySettings,
    ) -> (i64, NaiveDateTime) {
        let release = cycle_end + Duration::minutes(PLATE_RELEASE_MINUTES);
        let plate_index;

        if night_start {
            plate_index = END_OF_DAY_PRELOAD_PLATES - self.preloaded_plates + 1;
            self.preloaded_plates -= 1;
        } else {
            self.plates_in_use.push(release);
            plate_index = self.plates_occupied();
        }
        if shift == ShiftKind::EndOfDay && !night_start {
            self.end_of_day_cycle_used = true;
        }

        self.last_scheduled_color = Some(normalize_color(color));
        self.last_project_id = Some(project_id.to_string());
        self.current_time = cycle_end + Duration::minutes(settings.transition_minutes);

        (plate_index, release)
    }
}
