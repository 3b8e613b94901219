// ==========================================
// PrintFlow APS - Physical plate post-pass
// ==========================================
// After all days are scheduled, bound the autonomous
// night runs by the plates a printer physically
// holds: consecutive out-of-hours autonomous cycles
// beyond physicalPlateCapacity cannot all have clean
// plates, so the excess degrades from READY to
// WAITING_FOR_PLATE_RELOAD. Re-entering work hours
// resets the streak (the operator clears plates).
// ==========================================

use crate::domain::cycle::PlannedCycle;
use crate::domain::printer::Printer;
use crate::domain::product::PlatePreset;
use crate::domain::settings::FactorySettings;
use crate::domain::types::{AfterHoursBehavior, ReadinessState};
use crate::engine::calendar::Calendar;
use std::collections::HashMap;

// ==========================================
// PlateLimitPass
// ==========================================
pub struct PlateLimitPass;

impl PlateLimitPass {
    pub fn new() -> Self {
        Self
    }

    /// Degrade excess autonomous cycles in place. Returns how many
    /// cycles were downgraded.
    pub fn apply(
        &self,
        cycles: &mut [PlannedCycle],
        printers: &[Printer],
        presets_by_id: &HashMap<String, PlatePreset>,
        calendar: &Calendar,
        settings: &FactorySettings,
    ) -> usize {
        let printer_by_id: HashMap<&str, &Printer> = printers
            .iter()
            .map(|p| (p.printer_id.as_str(), p))
            .collect();

        // Indices per printer, walked in start order.
        let mut by_printer: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, cycle) in cycles.iter().enumerate() {
            by_printer
                .entry(cycle.printer_id.clone())
                .or_default()
                .push(i);
        }
        for indices in by_printer.values_mut() {
            indices.sort_by_key(|i| cycles[*i].start_time);
        }

        let mut downgraded = 0usize;

        for (printer_id, indices) in by_printer {
            let Some(printer) = printer_by_id.get(printer_id.as_str()) else {
                continue;
            };
            let capacity = printer.plate_capacity();
            let mut streak: i64 = 0;

            for i in indices {
                let autonomous = {
                    let cycle = &cycles[i];
                    let outside_work = !calendar.is_operator_present(cycle.start_time);
                    outside_work
                        && settings.after_hours_behavior == AfterHoursBehavior::FullAutomation
                        && printer.can_start_new_cycles_after_hours
                        && presets_by_id
                            .get(&cycle.preset_id)
                            .map(|p| p.allowed_for_night_cycle)
                            .unwrap_or(false)
                };

                if !autonomous {
                    streak = 0;
                    continue;
                }

                streak += 1;
                if streak > capacity {
                    let cycle = &mut cycles[i];
                    if cycle.readiness_state == ReadinessState::Ready {
                        cycle.readiness_state = ReadinessState::WaitingForPlateReload;
                        cycle.readiness_details = Some(format!(
                            "printer holds {} plates; this night cycle needs a reload first",
                            capacity
                        ));
                        downgraded += 1;
                        tracing::debug!(
                            printer_id = %printer_id,
                            cycle_id = %cycle.cycle_id,
                            streak,
                            "autonomous cycle downgraded to plate reload"
                        );
                    }
                }
            }
        }

        downgraded
    }
}

impl Default for PlateLimitPass {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{CycleSource, CycleStatus, PlateType, ShiftKind};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn printer(night: bool) -> Printer {
        Printer {
            printer_id: "PR-1".to_string(),
            name: "P1".to_string(),
            active: true,
            has_ams: false,
            ams_slot_count: 0,
            ams_backup_same_color: false,
            ams_multi_color: false,
            can_start_new_cycles_after_hours: night,
            physical_plate_capacity: 4,
            mounted_spool_id: None,
            mounted_color: None,
            ams_slots: vec![],
        }
    }

    fn preset(night: bool) -> PlatePreset {
        PlatePreset {
            preset_id: "P1".to_string(),
            product_id: "PROD-1".to_string(),
            name: "full".to_string(),
            units_per_plate: 8,
            cycle_hours: 2.0,
            risk_level: crate::domain::types::RiskLevel::Low,
            allowed_for_night_cycle: night,
            recommended: true,
            sort_order: 0,
        }
    }

    fn cycle(start: NaiveDateTime) -> PlannedCycle {
        PlannedCycle {
            cycle_id: format!("C-{}", start),
            project_id: "p".to_string(),
            printer_id: "PR-1".to_string(),
            units_planned: 8,
            grams_planned: 400.0,
            plate_type: PlateType::Full,
            start_time: start,
            end_time: start + Duration::hours(2),
            shift: ShiftKind::EndOfDay,
            status: CycleStatus::Planned,
            readiness_state: ReadinessState::Ready,
            readiness_details: None,
            required_color: "black".to_string(),
            required_grams: 400.0,
            suggested_spool_ids: vec![],
            preset_id: "P1".to_string(),
            preset_reason: None,
            plate_index: 1,
            plate_release_time: start + Duration::hours(2) + Duration::minutes(10),
            source: CycleSource::Auto,
            locked: false,
        }
    }

    fn night_settings() -> FactorySettings {
        let mut s = FactorySettings::default();
        s.after_hours_behavior = AfterHoursBehavior::FullAutomation;
        s
    }

    #[test]
    fn fifth_consecutive_night_cycle_downgrades() {
        let settings = night_settings();
        let calendar = Calendar::new(settings.weekly_schedule.clone());
        let presets: HashMap<String, PlatePreset> =
            [("P1".to_string(), preset(true))].into_iter().collect();

        let evening = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(17, 10, 0)
            .unwrap();
        let mut cycles: Vec<PlannedCycle> = (0..5)
            .map(|i| cycle(evening + Duration::minutes(130 * i)))
            .collect();

        let n = PlateLimitPass::new().apply(
            &mut cycles,
            &[printer(true)],
            &presets,
            &calendar,
            &settings,
        );
        assert_eq!(n, 1);
        assert_eq!(cycles[3].readiness_state, ReadinessState::Ready);
        assert_eq!(cycles[4].readiness_state, ReadinessState::WaitingForPlateReload);
        assert!(cycles[4].readiness_details.as_deref().unwrap().contains("reload"));
    }

    #[test]
    fn work_hours_reset_the_streak() {
        let settings = night_settings();
        let calendar = Calendar::new(settings.weekly_schedule.clone());
        let presets: HashMap<String, PlatePreset> =
            [("P1".to_string(), preset(true))].into_iter().collect();

        let evening = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(17, 10, 0)
            .unwrap();
        let mut cycles: Vec<PlannedCycle> = (0..4)
            .map(|i| cycle(evening + Duration::minutes(130 * i)))
            .collect();
        // Next morning, inside work hours.
        cycles.push(cycle(
            NaiveDate::from_ymd_opt(2026, 3, 3)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        ));
        // Next evening: streak starts over, stays under capacity.
        cycles.push(cycle(
            NaiveDate::from_ymd_opt(2026, 3, 3)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap(),
        ));

        let n = PlateLimitPass::new().apply(
            &mut cycles,
            &[printer(true)],
            &presets,
            &calendar,
            &settings,
        );
        assert_eq!(n, 0);
    }

    #[test]
    fn non_ready_cycles_left_alone() {
        let settings = night_settings();
        let calendar = Calendar::new(settings.weekly_schedule.clone());
        let presets: HashMap<String, PlatePreset> =
            [("P1".to_string(), preset(true))].into_iter().collect();

        let evening = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(17, 10, 0)
            .unwrap();
        let mut cycles: Vec<PlannedCycle> = (0..6)
            .map(|i| cycle(evening + Duration::minutes(130 * i)))
            .collect();
        cycles[4].readiness_state = ReadinessState::WaitingForSpool;
        cycles[5].readiness_state = ReadinessState::BlockedInventory;

        let n = PlateLimitPass::new().apply(
            &mut cycles,
            &[printer(true)],
            &presets,
            &calendar,
            &settings,
        );
        // Positions 5 and 6 exceed the streak but are not READY.
        assert_eq!(n, 0);
        assert_eq!(cycles[4].readiness_state, ReadinessState::WaitingForSpool);
        assert_eq!(cycles[5].readiness_state, ReadinessState::BlockedInventory);
    }
}
