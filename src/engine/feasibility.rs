// ==========================================
// PrintFlow APS - Feasibility validator
// ==========================================
// Aggregate material and time-budget checks before
// placement. Material shortfalls warn (partial plans
// are acceptable); impossible deadlines are reported
// as blocking issues but never abort the run.
// ==========================================

use crate::engine::calendar::Calendar;
use crate::engine::colors::normalize_color;
use crate::engine::material_view::MaterialView;
use crate::engine::prioritizer::ProjectPlanningState;
use crate::engine::snapshot::{
    BlockingIssue, BlockingIssueKind, PlanWarning, WarningKind, WarningSeverity,
};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

// ==========================================
// FeasibilityReport
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct FeasibilityReport {
    pub warnings: Vec<PlanWarning>,
    pub blocking_issues: Vec<BlockingIssue>,
}

// ==========================================
// FeasibilityValidator
// ==========================================
pub struct FeasibilityValidator {
    transition_minutes: i64,
    planning_horizon_days: i64,
}

impl FeasibilityValidator {
    pub fn new(transition_minutes: i64, planning_horizon_days: i64) -> Self {
        Self {
            transition_minutes,
            planning_horizon_days,
        }
    }

    pub fn validate(
        &self,
        states: &[ProjectPlanningState],
        material: &MaterialView,
        calendar: &Calendar,
        printer_count: usize,
        today: NaiveDate,
    ) -> FeasibilityReport {
        let mut report = FeasibilityReport::default();
        self.check_material(states, material, &mut report);
        self.check_time_budget(states, calendar, printer_count, today, &mut report);
        report
    }

    /// Sum demand per normalized color and compare to the view.
    fn check_material(
        &self,
        states: &[ProjectPlanningState],
        material: &MaterialView,
        report: &mut FeasibilityReport,
    ) {
        let mut demand_by_color: HashMap<String, f64> = HashMap::new();
        for state in states {
            let grams = state.remaining_units as f64 * state.product.grams_per_unit;
            *demand_by_color
                .entry(normalize_color(&state.project.color))
                .or_insert(0.0) += grams;
        }

        let mut colors: Vec<&String> = demand_by_color.keys().collect();
        colors.sort();
        for color in colors {
            let needed = demand_by_color[color];
            let available = material.available_grams(color);
            if needed > available {
                report.warnings.push(PlanWarning {
                    kind: WarningKind::MaterialLow,
                    severity: WarningSeverity::Warn,
                    project_id: None,
                    details: format!(
                        "color '{}' needs {:.0}g but only {:.0}g available",
                        color, needed, available
                    ),
                });
            }
        }
    }

    /// Compare each project's required print hours to the calendar
    /// capacity available before its deadline.
    fn check_time_budget(
        &self,
        states: &[ProjectPlanningState],
        calendar: &Calendar,
        printer_count: usize,
        today: NaiveDate,
        report: &mut FeasibilityReport,
    ) {
        for state in states {
            if state.preset.units_per_plate <= 0 {
                continue;
            }
            let cycles_needed = (state.remaining_units + state.preset.units_per_plate - 1)
                / state.preset.units_per_plate;
            let hours_needed = cycles_needed as f64 * state.preset.cycle_hours
                + (cycles_needed - 1).max(0) as f64 * self.transition_minutes as f64 / 60.0;

            let budget_days = state.days_until_due.min(self.planning_horizon_days).max(0);
            let mut available_hours = 0.0;
            for offset in 0..budget_days {
                if let Some(window) = calendar.schedule_for(today + Duration::days(offset)) {
                    available_hours += window.working_hours() * printer_count as f64;
                }
            }

            if hours_needed > available_hours && state.days_until_due <= self.planning_horizon_days
            {
                report.blocking_issues.push(BlockingIssue {
                    kind: BlockingIssueKind::DeadlineImpossible,
                    project_id: Some(state.project.project_id.clone()),
                    details: format!(
                        "needs {:.1}h of printing but only {:.1}h available before {}",
                        hours_needed, available_hours, state.project.due_date
                    ),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::{PlatePreset, Product};
    use crate::domain::project::Project;
    use crate::domain::settings::FactorySettings;
    use crate::domain::types::{ProjectStatus, RiskLevel, Urgency};

    fn state(remaining: i64, days_until_due: i64, color: &str) -> ProjectPlanningState {
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
                color: color.to_string(),
                target_quantity: remaining,
                completed_quantity: 0,
                scrap_quantity: 0,
                due_date: today + Duration::days(days_until_due),
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
            priority: days_until_due,
            days_until_due,
            preset_fallback: false,
        }
    }

    #[test]
    fn material_shortfall_warns_but_never_blocks() {
        let validator = FeasibilityValidator::new(10, 7);
        let calendar = Calendar::new(FactorySettings::default().weekly_schedule);
        let material = MaterialView::build(&[], &[]);
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let report = validator.validate(&[state(8, 5, "black")], &material, &calendar, 1, today);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, WarningKind::MaterialLow);
        assert!(report.blocking_issues.is_empty());
    }

    #[test]
    fn tight_deadline_reports_impossible() {
        let validator = FeasibilityValidator::new(10, 7);
        let calendar = Calendar::new(FactorySettings::default().weekly_schedule);
        let material = MaterialView::build(&[], &[]);
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(); // Monday

        // 40 units = 5 cycles x 2h + 4 transitions = 10.67h, one 8h day.
        let report = validator.validate(&[state(40, 1, "black")], &material, &calendar, 1, today);
        assert!(report
            .blocking_issues
            .iter()
            .any(|i| i.kind == BlockingIssueKind::DeadlineImpossible));
    }

    #[test]
    fn far_deadline_outside_horizon_not_flagged() {
        let validator = FeasibilityValidator::new(10, 7);
        let calendar = Calendar::new(FactorySettings::default().weekly_schedule);
        let material = MaterialView::build(&[], &[]);
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        // Huge job, but the deadline is past the horizon: the weekly
        // budget cannot judge it.
        let report = validator.validate(&[state(400, 30, "black")], &material, &calendar, 1, today);
        assert!(report.blocking_issues.is_empty());
    }
}
