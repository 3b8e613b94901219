// ==========================================
// PrintFlow APS - Printer domain model
// ==========================================
// Runtime fields (mounted color, AMS slot state) are
// owned by the local store and never overwritten from
// the remote mirror.
// ==========================================

use serde::{Deserialize, Serialize};

/// Default number of build plates a printer can hold at once.
pub const DEFAULT_PHYSICAL_PLATE_CAPACITY: i64 = 4;

// ==========================================
// AmsSlotState - one feeder slot
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmsSlotState {
    pub slot_index: i32,           // 0-based feeder slot
    pub color: Option<String>,     // mounted filament color
    pub spool_id: Option<String>,  // mounted spool, when known
}

// ==========================================
// Printer
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Printer {
    pub printer_id: String,                     // printer ID
    pub name: String,                           // display name
    pub active: bool,                           // inactive printers never receive cycles
    pub has_ams: bool,                          // multi-spool feeder present
    pub ams_slot_count: i32,                    // feeder slots (0 without AMS)
    pub ams_backup_same_color: bool,            // feeder mode: same-color backup
    pub ams_multi_color: bool,                  // feeder mode: multi-color plates
    pub can_start_new_cycles_after_hours: bool, // printer-level night gate
    pub physical_plate_capacity: i64,           // build plates the printer holds
    pub mounted_spool_id: Option<String>,       // spool on a non-AMS printer
    pub mounted_color: Option<String>,          // color on a non-AMS printer
    pub ams_slots: Vec<AmsSlotState>,           // per-slot state when AMS present
}

impl Printer {
    /// All colors currently mounted on this printer (AMS slots or the
    /// single held spool).
    pub fn mounted_colors(&self) -> Vec<&str> {
        if self.has_ams {
            self.ams_slots
                .iter()
                .filter_map(|s| s.color.as_deref())
                .collect()
        } else {
            self.mounted_color.as_deref().into_iter().collect()
        }
    }

    pub fn plate_capacity(&self) -> i64 {
        if self.physical_plate_capacity > 0 {
            self.physical_plate_capacity
        } else {
            DEFAULT_PHYSICAL_PLATE_CAPACITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mounted_colors_without_ams() {
        let printer = Printer {
            printer_id: "PR-1".to_string(),
            name: "P1".to_string(),
            active: true,
            has_ams: false,
            ams_slot_count: 0,
            ams_backup_same_color: false,
            ams_multi_color: false,
            can_start_new_cycles_after_hours: false,
            physical_plate_capacity: 4,
            mounted_spool_id: None,
            mounted_color: Some("black".to_string()),
            ams_slots: vec![],
        };
        assert_eq!(printer.mounted_colors(), vec!["black"]);
    }

    #[test]
    fn plate_capacity_defaults_when_unset() {
        let mut printer = Printer {
            printer_id: "PR-1".to_string(),
            name: "P1".to_string(),
            active: true,
            has_ams: false,
            ams_slot_count: 0,
            ams_backup_same_color: false,
            ams_multi_color: false,
            can_start_new_cycles_after_hours: false,
            physical_plate_capacity: 0,
            mounted_spool_id: None,
            mounted_color: None,
            ams_slots: vec![],
        };
        assert_eq!(printer.plate_capacity(), DEFAULT_PHYSICAL_PLATE_CAPACITY);
        printer.physical_plate_capacity = 6;
        assert_eq!(printer.plate_capacity(), 6);
    }
}
