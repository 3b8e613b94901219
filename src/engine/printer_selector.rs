// ==========================================
// PrintFlow APS - Minimum-printer selector
// ==========================================
// Grows the candidate printer set, best-scored first,
// until a dry run says the deadline is met. Falls
// back to every printer when nothing suffices. Each
// attempt leaves a decision-log trace.
// ==========================================

use crate::domain::settings::FactorySettings;
use crate::engine::calendar::Calendar;
use crate::engine::events::{DecisionEvent, PrinterScoreRecord, RunLog};
use crate::engine::printer_scorer::PrinterScorer;
use crate::engine::prioritizer::ProjectPlanningState;
use crate::engine::simulator::{DryRunEstimate, DryRunSimulator};
use crate::engine::slot::PrinterSlot;
use chrono::NaiveDateTime;

// ==========================================
// PrinterSelection
// ==========================================
#[derive(Debug, Clone)]
pub struct PrinterSelection {
    /// Indices into the caller's slot list, best-scored first.
    pub slot_indices: Vec<usize>,
    pub estimate: DryRunEstimate,
    pub scores: Vec<PrinterScoreRecord>,
}

// ==========================================
// MinimumPrinterSelector
// ==========================================
pub struct MinimumPrinterSelector {
    scorer: PrinterScorer,
    simulator: DryRunSimulator,
}

impl MinimumPrinterSelector {
    pub fn new() -> Self {
        Self {
            scorer: PrinterScorer::new(),
            simulator: DryRunSimulator::new(),
        }
    }

    pub fn select(
        &self,
        slots: &[PrinterSlot],
        state: &ProjectPlanningState,
        calendar: &Calendar,
        settings: &FactorySettings,
        now: NaiveDateTime,
        log: &mut RunLog,
    ) -> PrinterSelection {
        // Score every printer for this project.
        let mut scored: Vec<(usize, PrinterScoreRecord)> = slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| {
                let record = self.scorer.score(
                    slot,
                    &state.project.project_id,
                    &state.project.color,
                    now,
                    calendar,
                );
                (idx, record)
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.score
                .total_cmp(&a.1.score)
                .then_with(|| slots[a.0].order.cmp(&slots[b.0].order))
        });

        let scores: Vec<PrinterScoreRecord> = scored.iter().map(|(_, r)| r.clone()).collect();

        // Grow the set until the dry run meets the deadline.
        let mut chosen: Vec<usize> = Vec::new();
        let mut last_estimate: Option<DryRunEstimate> = None;
        for k in 1..=scored.len() {
            chosen = scored[..k].iter().map(|(idx, _)| *idx).collect();
            let subset: Vec<PrinterSlot> = chosen.iter().map(|idx| slots[*idx].clone()).collect();
            let estimate = self
                .simulator
                .estimate(&subset, state, calendar, settings, now);
            let meets = estimate.meets_deadline;
            last_estimate = Some(estimate);
            if meets {
                break;
            }
        }

        let estimate = last_estimate.unwrap_or(DryRunEstimate {
            finish_time: None,
            cycle_count: 0,
            meets_deadline: false,
            margin_hours: 0.0,
        });

        log.record_decision(DecisionEvent {
            project_id: state.project.project_id.clone(),
            deadline: state.project.due_date,
            remaining_units: state.remaining_units,
            selected_printers: chosen
                .iter()
                .map(|idx| slots[*idx].printer.printer_id.clone())
                .collect(),
            estimated_finish_time: estimate.finish_time,
            meets_deadline: estimate.meets_deadline,
            margin_hours: estimate.margin_hours,
            per_printer_scores: scores.clone(),
        });

        PrinterSelection {
            slot_indices: chosen,
            estimate,
            scores,
        }
    }
}

impl Default for MinimumPrinterSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::printer::Printer;
    use crate::domain::product::{PlatePreset, Product};
    use crate::domain::project::Project;
    use crate::domain::types::{ProjectStatus, RiskLevel, Urgency};
    use chrono::{Duration, NaiveDate};

    fn printer(id: &str, color: Option<&str>) -> Printer {
        Printer {
            printer_id: id.to_string(),
            name: id.to_string(),
            active: true,
            has_ams: false,
            ams_slot_count: 0,
            ams_backup_same_color: false,
            ams_multi_color: false,
            can_start_new_cycles_after_hours: false,
            physical_plate_capacity: 4,
            mounted_spool_id: None,
            mounted_color: color.map(|c| c.to_string()),
            ams_slots: vec![],
        }
    }

    fn state(remaining: i64, due_in_days: i64) -> ProjectPlanningState {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let preset = PlatePreset {
            preset_id: "P1".to_string(),
            product_id: "PROD-1".to_string(),
            name: "full".to_string(),
            units_per_plate: 8,
            cycle_hours: 2.0,
            risk_level: RiskLevel::Low,
            allowed_for_night_cycle: true,
            recommended: true,
            sort_order: 0,
        };
        ProjectPlanningState {
            project: Project {
                project_id: "p".to_string(),
                cloud_id: None,
                legacy_id: None,
                name: "p".to_string(),
                product_id: "PROD-1".to_string(),
                color: "black".to_string(),
                target_quantity: remaining,
                completed_quantity: 0,
                scrap_quantity: 0,
                due_date: today + Duration::days(due_in_days),
                urgency: Urgency::Normal,
                manual_urgency_override: false,
                status: ProjectStatus::Pending,
                include_in_planning: true,
                preferred_preset_id: None,
                custom_cycle_hours: None,
                parent_project_id: None,
                created_at: today.and_hms_opt(8, 0, 0).unwrap(),
                updated_at: today.and_hms_opt(8, 0, 0).unwrap(),
            },
            product: Product {
                product_id: "PROD-1".to_string(),
                name: "p".to_string(),
                grams_per_unit: 50.0,
                presets: vec![preset.clone()],
            },
            preset,
            remaining_units: remaining,
            priority: due_in_days,
            days_until_due: due_in_days,
            preset_fallback: false,
        }
    }

    fn slots(calendar: &Calendar, settings: &FactorySettings) -> Vec<PrinterSlot> {
        let now = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        vec![
            PrinterSlot::new(printer("PR-1", Some("black")), 0, now, None, calendar, settings),
            PrinterSlot::new(printer("PR-2", None), 1, now, None, calendar, settings),
            PrinterSlot::new(printer("PR-3", Some("red")), 2, now, None, calendar, settings),
        ]
    }

    #[test]
    fn small_job_takes_one_printer() {
        let settings = FactorySettings::default();
        let calendar = Calendar::new(settings.weekly_schedule.clone());
        let all = slots(&calendar, &settings);
        let now = all[0].current_time;
        let mut log = RunLog::new();

        let selection = MinimumPrinterSelector::new().select(
            &all,
            &state(16, 5),
            &calendar,
            &settings,
            now,
            &mut log,
        );
        assert_eq!(selection.slot_indices, vec![0]); // best color match
        assert!(selection.estimate.meets_deadline);
        assert_eq!(log.decisions().len(), 1);
        assert_eq!(log.decisions()[0].per_printer_scores.len(), 3);
    }

    #[test]
    fn tight_deadline_grows_the_set() {
        let settings = FactorySettings::default();
        let calendar = Calendar::new(settings.weekly_schedule.clone());
        let all = slots(&calendar, &settings);
        let now = all[0].current_time;
        let mut log = RunLog::new();

        // 40 units / 5 cycles, due tomorrow: one printer fits only 3
        // cycles today.
        let selection = MinimumPrinterSelector::new().select(
            &all,
            &state(40, 1),
            &calendar,
            &settings,
            now,
            &mut log,
        );
        assert!(selection.slot_indices.len() >= 2);
        assert!(selection.estimate.meets_deadline);
    }

    #[test]
    fn hopeless_deadline_returns_all_printers() {
        let settings = FactorySettings::default();
        let calendar = Calendar::new(settings.weekly_schedule.clone());
        let all = slots(&calendar, &settings);
        let now = all[0].current_time;
        let mut log = RunLog::new();

        let selection = MinimumPrinterSelector::new().select(
            &all,
            &state(400, 1),
            &calendar,
            &settings,
            now,
            &mut log,
        );
        assert_eq!(selection.slot_indices.len(), 3);
        assert!(!selection.estimate.meets_deadline);
    }
}
