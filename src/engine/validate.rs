// ==========================================
// PrintFlow APS - Existing-plan integrity checks
// ==========================================
// Validates the persisted plan without touching it:
// per-printer overlaps, cycles on disabled days that
// the night policy does not cover, and references to
// projects that no longer exist or are inactive.
// ==========================================

use crate::domain::types::AfterHoursBehavior;
use crate::engine::calendar::Calendar;
use crate::engine::snapshot::PlanningSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ==========================================
// PlanValidation
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanIssue {
    pub kind: PlanIssueKind,
    pub cycle_id: String,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanIssueKind {
    Overlap,
    OutsideWorkday,
    OrphanProject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanValidation {
    pub is_valid: bool,
    pub issues: Vec<PlanIssue>,
}

// ==========================================
// PlanValidator
// ==========================================
pub struct PlanValidator;

impl PlanValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, snapshot: &PlanningSnapshot) -> PlanValidation {
        let calendar = Calendar::new(snapshot.settings.weekly_schedule.clone());
        let mut issues: Vec<PlanIssue> = Vec::new();

        // Preset night flags, for the disabled-day check.
        let night_preset_ids: HashSet<&str> = snapshot
            .products
            .iter()
            .flat_map(|p| p.presets.iter())
            .filter(|p| p.allowed_for_night_cycle)
            .map(|p| p.preset_id.as_str())
            .collect();
        let printer_by_id: HashMap<&str, _> = snapshot
            .printers
            .iter()
            .map(|p| (p.printer_id.as_str(), p))
            .collect();
        let active_projects: HashSet<&str> = snapshot
            .projects
            .iter()
            .filter(|p| p.status.is_active())
            .map(|p| p.project_id.as_str())
            .collect();

        // Non-terminal cycles per printer, sorted by start.
        let mut by_printer: HashMap<&str, Vec<&crate::domain::cycle::PlannedCycle>> =
            HashMap::new();
        for cycle in &snapshot.existing_cycles {
            if !cycle.status.is_terminal() {
                by_printer
                    .entry(cycle.printer_id.as_str())
                    .or_default()
                    .push(cycle);
            }
        }

        for cycles in by_printer.values_mut() {
            cycles.sort_by_key(|c| c.start_time);
            for pair in cycles.windows(2) {
                if pair[0].overlaps(pair[1]) {
                    issues.push(PlanIssue {
                        kind: PlanIssueKind::Overlap,
                        cycle_id: pair[1].cycle_id.clone(),
                        details: format!(
                            "overlaps cycle '{}' on printer '{}'",
                            pair[0].cycle_id, pair[0].printer_id
                        ),
                    });
                }
            }
        }

        for cycle in &snapshot.existing_cycles {
            if cycle.status.is_terminal() {
                continue;
            }

            // Cycles outside any work window need the full autonomous
            // gate chain.
            if !calendar.is_operator_present(cycle.start_time) {
                let policy_ok =
                    snapshot.settings.after_hours_behavior != AfterHoursBehavior::None;
                let printer_ok = printer_by_id
                    .get(cycle.printer_id.as_str())
                    .map(|p| p.can_start_new_cycles_after_hours)
                    .unwrap_or(false);
                let preset_ok = night_preset_ids.contains(cycle.preset_id.as_str());
                let autonomous_ok = snapshot.settings.after_hours_behavior
                    == AfterHoursBehavior::FullAutomation
                    && printer_ok
                    && preset_ok;
                // ONE_CYCLE_END_OF_DAY covers the single crossing
                // cycle tagged end_of_day.
                let end_of_day_ok = policy_ok
                    && cycle.shift == crate::domain::types::ShiftKind::EndOfDay;
                if !autonomous_ok && !end_of_day_ok {
                    issues.push(PlanIssue {
                        kind: PlanIssueKind::OutsideWorkday,
                        cycle_id: cycle.cycle_id.clone(),
                        details: format!(
                            "starts {} outside any permitted work window",
                            cycle.start_time
                        ),
                    });
                }
            }

            if !active_projects.contains(cycle.project_id.as_str()) {
                issues.push(PlanIssue {
                    kind: PlanIssueKind::OrphanProject,
                    cycle_id: cycle.cycle_id.clone(),
                    details: format!(
                        "references project '{}' which is missing or inactive",
                        cycle.project_id
                    ),
                });
            }
        }

        PlanValidation {
            is_valid: issues.is_empty(),
            issues,
        }
    }
}

impl Default for PlanValidator {
    fn default() -> Self {
        Self::new()
    }
}
