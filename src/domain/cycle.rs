// ==========================================
// PrintFlow APS - Planned cycle domain model
// ==========================================
// One print job on one printer producing units of
// one project in one plate layout. Cycles outlive a
// planning run; the engine only rewrites cycles that
// are still PLANNED and not locked.
// ==========================================

use crate::domain::types::{CycleSource, CycleStatus, PlateType, ReadinessState, ShiftKind};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// PlannedCycle
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedCycle {
    pub cycle_id: String,                    // cycle ID (stable across mirror upserts)
    pub project_id: String,                  // order being produced
    pub printer_id: String,                  // printer the cycle runs on
    pub units_planned: i64,                  // units this cycle yields
    pub grams_planned: f64,                  // filament weight this cycle consumes
    pub plate_type: PlateType,               // FULL / REDUCED / CLOSEOUT
    pub start_time: NaiveDateTime,           // planned start
    pub end_time: NaiveDateTime,             // planned end
    pub shift: ShiftKind,                    // DAY / END_OF_DAY
    pub status: CycleStatus,                 // temporal state
    pub readiness_state: ReadinessState,     // gating state
    pub readiness_details: Option<String>,   // human text for the gating state
    pub required_color: String,              // filament color the cycle needs
    pub required_grams: f64,                 // grams the cycle needs
    pub suggested_spool_ids: Vec<String>,    // up to 3 spools that could feed it
    pub preset_id: String,                   // plate layout used
    pub preset_reason: Option<String>,       // why this layout was selected
    pub plate_index: i64,                    // 1-based plate slot on the printer's day
    pub plate_release_time: NaiveDateTime,   // when the plate frees up
    pub source: CycleSource,                 // AUTO / MANUAL
    pub locked: bool,                        // locked cycles are never rewritten
}

impl PlannedCycle {
    /// Immovable facts: terminal cycles, manual locks, and (when the
    /// caller asks) work already in flight.
    pub fn is_preserved(&self, lock_in_progress: bool) -> bool {
        if self.status.is_terminal() {
            return true;
        }
        if self.locked && self.source == CycleSource::Manual {
            return true;
        }
        if self.status == CycleStatus::InProgress && lock_in_progress {
            return true;
        }
        false
    }

    /// Half-open interval overlap on the same printer.
    pub fn overlaps(&self, other: &PlannedCycle) -> bool {
        self.printer_id == other.printer_id
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn cycle(start_h: u32, end_h: u32, status: CycleStatus) -> PlannedCycle {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        PlannedCycle {
            cycle_id: "C-1".to_string(),
            project_id: "PRJ-1".to_string(),
            printer_id: "PR-1".to_string(),
            units_planned: 8,
            grams_planned: 400.0,
            plate_type: PlateType::Full,
            start_time: day.and_hms_opt(start_h, 0, 0).unwrap(),
            end_time: day.and_hms_opt(end_h, 0, 0).unwrap(),
            shift: ShiftKind::Day,
            status,
            readiness_state: ReadinessState::Ready,
            readiness_details: None,
            required_color: "black".to_string(),
            required_grams: 400.0,
            suggested_spool_ids: vec![],
            preset_id: "P-1".to_string(),
            preset_reason: None,
            plate_index: 1,
            plate_release_time: day.and_hms_opt(end_h, 10, 0).unwrap(),
            source: CycleSource::Auto,
            locked: false,
        }
    }

    #[test]
    fn preservation_rules() {
        assert!(cycle(9, 11, CycleStatus::Completed).is_preserved(false));
        assert!(cycle(9, 11, CycleStatus::Failed).is_preserved(false));
        assert!(cycle(9, 11, CycleStatus::InProgress).is_preserved(true));
        assert!(!cycle(9, 11, CycleStatus::InProgress).is_preserved(false));
        assert!(!cycle(9, 11, CycleStatus::Planned).is_preserved(true));

        let mut manual = cycle(9, 11, CycleStatus::Planned);
        manual.locked = true;
        manual.source = CycleSource::Manual;
        assert!(manual.is_preserved(false));

        // Locked but auto-authored cycles are still replaceable.
        let mut auto_locked = cycle(9, 11, CycleStatus::Planned);
        auto_locked.locked = true;
        assert!(!auto_locked.is_preserved(false));
    }

    #[test]
    fn overlap_is_half_open() {
        let a = cycle(9, 11, CycleStatus::Planned);
        let mut b = cycle(11, 13, CycleStatus::Planned);
        assert!(!a.overlaps(&b));
        b.start_time = b.start_time - chrono::Duration::minutes(30);
        assert!(a.overlaps(&b));
        b.printer_id = "PR-2".to_string();
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn serde_round_trip_preserves_times() {
        let c = cycle(9, 11, CycleStatus::Planned);
        let json = serde_json::to_string(&c).unwrap();
        let back: PlannedCycle = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
