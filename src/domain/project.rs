// ==========================================
// PrintFlow APS - Project domain model
// ==========================================
// A project is one open customer order for a
// single product in a single color.
// ==========================================

use crate::domain::types::{ProjectStatus, Urgency};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Project - an open order
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,             // project ID (local)
    pub cloud_id: Option<String>,       // remote mirror UUID, if already synced
    pub legacy_id: Option<String>,      // stable legacy identifier for the mirror
    pub name: String,                   // display name
    pub product_id: String,             // catalog item reference
    pub color: String,                  // requested filament color (normalized for comparison)
    pub target_quantity: i64,           // units ordered
    pub completed_quantity: i64,        // units already produced
    pub scrap_quantity: i64,            // units scrapped during execution
    pub due_date: NaiveDate,            // committed delivery date
    pub urgency: Urgency,               // NORMAL / URGENT / CRITICAL
    pub manual_urgency_override: bool,  // true when a human pinned the urgency
    pub status: ProjectStatus,          // lifecycle state
    pub include_in_planning: bool,      // false removes the project from the planner
    pub preferred_preset_id: Option<String>, // operator-chosen plate layout
    pub custom_cycle_hours: Option<f64>,     // overrides the preset cycle length
    pub parent_project_id: Option<String>,   // recovery linkage (scrap reruns)
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Project {
    /// Units the planner still has to produce, before subtracting
    /// work already committed in in-progress cycles.
    pub fn open_quantity(&self) -> i64 {
        (self.target_quantity - self.completed_quantity).max(0)
    }

    /// Whether the planner is allowed to touch this project at all.
    pub fn is_plannable(&self) -> bool {
        self.status.is_active() && self.include_in_planning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn project(target: i64, completed: i64) -> Project {
        Project {
            project_id: "PRJ-1".to_string(),
            cloud_id: None,
            legacy_id: Some("legacy-1".to_string()),
            name: "Bracket run".to_string(),
            product_id: "PROD-1".to_string(),
            color: "Black".to_string(),
            target_quantity: target,
            completed_quantity: completed,
            scrap_quantity: 0,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            urgency: Urgency::Normal,
            manual_urgency_override: false,
            status: ProjectStatus::Pending,
            include_in_planning: true,
            preferred_preset_id: None,
            custom_cycle_hours: None,
            parent_project_id: None,
            created_at: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            updated_at: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn open_quantity_never_negative() {
        assert_eq!(project(10, 4).open_quantity(), 6);
        assert_eq!(project(10, 12).open_quantity(), 0);
    }

    #[test]
    fn plannable_requires_active_status_and_flag() {
        let mut p = project(10, 0);
        assert!(p.is_plannable());
        p.include_in_planning = false;
        assert!(!p.is_plannable());
        p.include_in_planning = true;
        p.status = ProjectStatus::Completed;
        assert!(!p.is_plannable());
    }
}
