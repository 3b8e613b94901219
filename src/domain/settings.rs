// ==========================================
// PrintFlow APS - Factory settings
// ==========================================
// The weekly calendar, the after-hours policy and
// the planner tunables. Persisted as one JSON
// document in the settings table.
// ==========================================

use crate::domain::types::AfterHoursBehavior;
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

// ==========================================
// DaySchedule - one weekday's work window
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub enabled: bool,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl DaySchedule {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            start_time: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        }
    }

    pub fn working(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            enabled: true,
            start_time: start,
            end_time: end,
        }
    }

    /// Shift length in hours. An end before the start means the shift
    /// crosses midnight, so the end is read as next-day time.
    pub fn working_hours(&self) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        let start_min = self.start_time.signed_duration_since(NaiveTime::MIN).num_minutes();
        let end_min = self.end_time.signed_duration_since(NaiveTime::MIN).num_minutes();
        let span_min = if end_min < start_min {
            end_min + 24 * 60 - start_min
        } else {
            end_min - start_min
        };
        span_min as f64 / 60.0
    }
}

// ==========================================
// WeeklySchedule - Monday-first, 7 entries
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub days: [DaySchedule; 7],
}

impl WeeklySchedule {
    pub fn day_for(&self, date: NaiveDate) -> &DaySchedule {
        use chrono::Datelike;
        &self.days[date.weekday().num_days_from_monday() as usize]
    }

    pub fn day_for_weekday(&self, weekday: Weekday) -> &DaySchedule {
        &self.days[weekday.num_days_from_monday() as usize]
    }
}

// ==========================================
// PriorityRules - urgency caps in days
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRules {
    pub urgent_days_threshold: i64,
    pub critical_days_threshold: i64,
}

impl Default for PriorityRules {
    fn default() -> Self {
        Self {
            urgent_days_threshold: 15,
            critical_days_threshold: 5,
        }
    }
}

// ==========================================
// FeatureToggles
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureToggles {
    /// Project-centric planner (minimum-printer selection) vs. the
    /// legacy fill-printer-first pass.
    pub planner_v2_project_centric: bool,
    /// Enables the physical-plate post-pass that degrades excess
    /// autonomous cycles to WAITING_FOR_PLATE_RELOAD.
    pub physical_plates_limit: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            planner_v2_project_centric: true,
            physical_plates_limit: true,
        }
    }
}

// ==========================================
// FactorySettings
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorySettings {
    pub weekly_schedule: WeeklySchedule,
    pub after_hours_behavior: AfterHoursBehavior,
    /// Minutes between successive cycles on the same printer
    /// (plate swap + head cleanup).
    pub transition_minutes: i64,
    pub priority_rules: PriorityRules,
    /// Nominal weight of a standard closed spool.
    pub standard_spool_grams: f64,
    /// Days of calendar the feasibility check budgets against.
    pub planning_horizon_days: i64,
    pub feature_toggles: FeatureToggles,
}

impl Default for FactorySettings {
    fn default() -> Self {
        let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        let workday = DaySchedule::working(start, end);
        Self {
            // Monday..Friday on, weekend off.
            weekly_schedule: WeeklySchedule {
                days: [
                    workday,
                    workday,
                    workday,
                    workday,
                    workday,
                    DaySchedule::disabled(),
                    DaySchedule::disabled(),
                ],
            },
            after_hours_behavior: AfterHoursBehavior::None,
            transition_minutes: 10,
            priority_rules: PriorityRules::default(),
            standard_spool_grams: 1000.0,
            planning_horizon_days: 7,
            feature_toggles: FeatureToggles::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_hours_regular_shift() {
        let day = DaySchedule::working(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        );
        assert!((day.working_hours() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn working_hours_cross_midnight() {
        let day = DaySchedule::working(
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        );
        assert!((day.working_hours() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn default_settings_have_five_workdays() {
        let settings = FactorySettings::default();
        let enabled = settings
            .weekly_schedule
            .days
            .iter()
            .filter(|d| d.enabled)
            .count();
        assert_eq!(enabled, 5);
        assert_eq!(settings.transition_minutes, 10);
    }

    #[test]
    fn settings_json_round_trip() {
        let settings = FactorySettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: FactorySettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }
}
