// ==========================================
// PrintFlow APS - Printer scorer
// ==========================================
// Ranks printers for one project: how soon the slot
// frees up, whether the right color is already
// mounted, and whether the printer was already
// running this project.
// ==========================================

use crate::engine::calendar::Calendar;
use crate::engine::colors::normalize_color;
use crate::engine::events::PrinterScoreRecord;
use crate::engine::slot::PrinterSlot;
use chrono::NaiveDateTime;

// ==========================================
// PrinterScorer
// ==========================================
pub struct PrinterScorer;

impl PrinterScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score one slot for one project. Higher is better.
    pub fn score(
        &self,
        slot: &PrinterSlot,
        project_id: &str,
        project_color: &str,
        now: NaiveDateTime,
        calendar: &Calendar,
    ) -> PrinterScoreRecord {
        let mut reasons: Vec<String> = Vec::new();

        // Effective availability: a slot already past its day jumps to
        // the next workday start.
        let effective_time = if slot.current_time >= slot.end_of_day {
            calendar
                .advance_to_next_workday_start(slot.current_time)
                .unwrap_or(slot.current_time)
        } else {
            slot.current_time.max(now)
        };

        let wait_hours = ((effective_time - now).num_minutes() as f64 / 60.0).max(0.0);
        let availability = 40.0 * (1.0 - wait_hours.min(24.0) / 24.0);
        reasons.push(format!("available in {:.1}h (+{:.0})", wait_hours, availability));

        let wanted = normalize_color(project_color);
        let color_points = match slot.last_scheduled_color.as_deref() {
            Some(mounted) if mounted == wanted => {
                reasons.push("color already mounted (+30)".to_string());
                30.0
            }
            None => {
                reasons.push("no color loaded (+15)".to_string());
                15.0
            }
            Some(_) => {
                reasons.push("color switch needed (+0)".to_string());
                0.0
            }
        };

        let switch_points = if slot.last_scheduled_color.as_deref() == Some(wanted.as_str()) {
            reasons.push("no switch cost (+5)".to_string());
            5.0
        } else {
            0.0
        };

        let continuity_points = if slot.last_project_id.as_deref() == Some(project_id) {
            reasons.push("continues same project (+15)".to_string());
            15.0
        } else {
            0.0
        };

        PrinterScoreRecord {
            printer_id: slot.printer.printer_id.clone(),
            score: availability + color_points + switch_points + continuity_points,
            wait_hours,
            reasons,
        }
    }
}

impl Default for PrinterScorer {
    fn default() -> Self {
        Self::new()
    }
}
