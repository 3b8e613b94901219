// ==========================================
// PrintFlow APS - Deadline impact check
// ==========================================
// Advisory estimate of what accepting a new order
// would do to existing commitments, without running
// a full second plan: the draft's print hours are
// attributed to earlier-or-equal-deadline projects,
// weighted by whether they compete for the same
// filament color.
// ==========================================

use crate::engine::colors::same_color;
use crate::engine::snapshot::PlanningSnapshot;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Slack below this many hours counts as at risk.
pub const SLACK_THRESHOLD_HOURS: f64 = 4.0;

/// Attribution of the draft's hours to a same-color project.
const SHARED_COLOR_ATTRIBUTION: f64 = 0.5;
/// Attribution to a different-color project (they still share printers).
const OTHER_COLOR_ATTRIBUTION: f64 = 0.2;

// ==========================================
// ProjectDraft - an order not yet saved
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub product_id: String,
    pub color: String,
    pub quantity: i64,
    pub due_date: NaiveDate,
    pub preferred_preset_id: Option<String>,
}

// ==========================================
// DeadlineImpactResult
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactedProject {
    pub project_id: String,
    pub current_slack_hours: f64,
    pub projected_slack_hours: f64,
    pub shares_color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineImpactResult {
    /// Projects whose slack would drop below the threshold or negative.
    pub impacted: Vec<ImpactedProject>,
    /// Estimated print hours the draft adds.
    pub draft_hours: f64,
}

// ==========================================
// DeadlineImpactChecker
// ==========================================
pub struct DeadlineImpactChecker;

impl DeadlineImpactChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, snapshot: &PlanningSnapshot, draft: &ProjectDraft) -> DeadlineImpactResult {
        let draft_hours = self.estimate_draft_hours(snapshot, draft);

        // Last planned cycle end per project, from the live plan.
        let mut last_end: HashMap<&str, NaiveDateTime> = HashMap::new();
        for cycle in &snapshot.existing_cycles {
            if cycle.status.is_terminal() {
                continue;
            }
            let entry = last_end
                .entry(cycle.project_id.as_str())
                .or_insert(cycle.end_time);
            if cycle.end_time > *entry {
                *entry = cycle.end_time;
            }
        }

        let mut impacted: Vec<ImpactedProject> = Vec::new();
        for project in &snapshot.projects {
            if !project.status.is_active() {
                continue;
            }
            let Some(end) = last_end.get(project.project_id.as_str()) else {
                continue; // nothing scheduled, nothing to squeeze
            };
            // The draft only pressures projects it must finish before
            // or alongside.
            if draft.due_date > project.due_date {
                continue;
            }

            let deadline = project
                .due_date
                .and_hms_opt(0, 0, 0)
                .expect("valid midnight");
            let current_slack = (deadline - *end).num_minutes() as f64 / 60.0;

            let shares_color = same_color(&draft.color, &project.color);
            let attribution = if shares_color {
                SHARED_COLOR_ATTRIBUTION
            } else {
                OTHER_COLOR_ATTRIBUTION
            };
            let projected_slack = current_slack - draft_hours * attribution;

            let was_fine = current_slack >= SLACK_THRESHOLD_HOURS;
            let now_risky = projected_slack < SLACK_THRESHOLD_HOURS || projected_slack < 0.0;
            if was_fine && now_risky {
                impacted.push(ImpactedProject {
                    project_id: project.project_id.clone(),
                    current_slack_hours: current_slack,
                    projected_slack_hours: projected_slack,
                    shares_color,
                });
            }
        }

        impacted.sort_by(|a, b| a.projected_slack_hours.total_cmp(&b.projected_slack_hours));

        DeadlineImpactResult {
            impacted,
            draft_hours,
        }
    }

    /// Hours of printing the draft implies, using its product's
    /// resolved preset.
    fn estimate_draft_hours(&self, snapshot: &PlanningSnapshot, draft: &ProjectDraft) -> f64 {
        let Some(product) = snapshot
            .products
            .iter()
            .find(|p| p.product_id == draft.product_id)
        else {
            return 0.0;
        };
        let preset = draft
            .preferred_preset_id
            .as_deref()
            .and_then(|id| product.preset_by_id(id))
            .or_else(|| product.recommended_preset());
        let Some(preset) = preset else {
            return 0.0;
        };
        if preset.units_per_plate <= 0 {
            return 0.0;
        }
        let cycles = (draft.quantity + preset.units_per_plate - 1) / preset.units_per_plate;
        cycles as f64 * preset.cycle_hours
            + (cycles - 1).max(0) as f64 * snapshot.settings.transition_minutes as f64 / 60.0
    }
}

impl Default for DeadlineImpactChecker {
    fn default() -> Self {
        Self::new()
    }
}
