// ==========================================
// PrintFlow APS - Project prioritizer
// ==========================================
// Filters plannable projects, resolves each one's
// plate preset, and orders them by deadline pressure.
// Lower priority value = planned earlier. Stable:
// the same input always yields the same sequence.
// ==========================================

use crate::domain::cycle::PlannedCycle;
use crate::domain::product::{PlatePreset, Product};
use crate::domain::project::Project;
use crate::domain::settings::PriorityRules;
use crate::domain::types::{CycleStatus, Urgency};
use chrono::NaiveDate;
use std::collections::HashMap;

// ==========================================
// ProjectPlanningState - one prioritized project
// ==========================================
#[derive(Debug, Clone)]
pub struct ProjectPlanningState {
    pub project: Project,
    pub product: Product,
    pub preset: PlatePreset,
    pub remaining_units: i64,
    pub priority: i64,
    pub days_until_due: i64,
    /// Set when the project's product/preset references were broken
    /// and the migration fallback kicked in.
    pub preset_fallback: bool,
}

// ==========================================
// Prioritizer
// ==========================================
pub struct Prioritizer {
    rules: PriorityRules,
}

impl Prioritizer {
    pub fn new(rules: PriorityRules) -> Self {
        Self { rules }
    }

    /// Build the ordered planning queue.
    ///
    /// Remaining units subtract both completed work and units already
    /// committed in in-progress cycles; projects with nothing left are
    /// dropped here.
    pub fn prioritize(
        &self,
        projects: &[Project],
        products: &[Product],
        existing_cycles: &[PlannedCycle],
        today: NaiveDate,
    ) -> Vec<ProjectPlanningState> {
        let product_by_id: HashMap<&str, &Product> = products
            .iter()
            .map(|p| (p.product_id.as_str(), p))
            .collect();

        // Units currently being produced, per project.
        let mut in_flight: HashMap<&str, i64> = HashMap::new();
        for cycle in existing_cycles {
            if cycle.status == CycleStatus::InProgress {
                *in_flight.entry(cycle.project_id.as_str()).or_insert(0) +=
                    cycle.units_planned;
            }
        }

        let mut states: Vec<ProjectPlanningState> = Vec::new();

        for project in projects {
            if !project.is_plannable() {
                continue;
            }

            let committed = in_flight
                .get(project.project_id.as_str())
                .copied()
                .unwrap_or(0);
            let remaining = project.open_quantity() - committed;
            if remaining <= 0 {
                continue;
            }

            let (product, preset, fallback) =
                match self.resolve_preset(project, &product_by_id, products) {
                    Some(resolved) => resolved,
                    None => {
                        tracing::warn!(
                            project_id = %project.project_id,
                            product_id = %project.product_id,
                            "no product or preset resolvable; project skipped"
                        );
                        continue;
                    }
                };

            let days_until_due = (project.due_date - today).num_days();
            let priority = self.priority_for(project.urgency, days_until_due);

            states.push(ProjectPlanningState {
                project: project.clone(),
                product: product.clone(),
                preset: preset.clone(),
                remaining_units: remaining,
                priority,
                days_until_due,
                preset_fallback: fallback,
            });
        }

        // Stable sort keeps insertion order for full ties.
        states.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.days_until_due.cmp(&b.days_until_due))
        });
        states
    }

    /// Preferred preset if valid, else the product's recommended, else
    /// its first. A broken product reference falls back to the first
    /// product's first preset (data migrated from older versions can
    /// carry stale ids).
    fn resolve_preset<'a>(
        &self,
        project: &Project,
        product_by_id: &HashMap<&str, &'a Product>,
        products: &'a [Product],
    ) -> Option<(&'a Product, &'a PlatePreset, bool)> {
        if let Some(&product) = product_by_id.get(project.product_id.as_str()) {
            if let Some(preferred_id) = project.preferred_preset_id.as_deref() {
                if let Some(preset) = product.preset_by_id(preferred_id) {
                    return Some((product, preset, false));
                }
            }
            if let Some(preset) = product.recommended_preset() {
                return Some((product, preset, false));
            }
        }

        let first_product = products.first()?;
        let first_preset = first_product.presets.first()?;
        Some((first_product, first_preset, true))
    }

    /// Urgency caps the raw deadline distance; a manual critical flag
    /// on a far-out deadline still plans like a 5-day order.
    fn priority_for(&self, urgency: Urgency, days_until_due: i64) -> i64 {
        match urgency {
            Urgency::Critical => days_until_due.min(self.rules.critical_days_threshold),
            Urgency::Urgent => days_until_due.min(self.rules.urgent_days_threshold),
            Urgency::Normal => days_until_due,
        }
    }
}
