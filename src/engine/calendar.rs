// ==========================================
// PrintFlow APS - Factory calendar
// ==========================================
// Day schedule lookup, next-workday search and the
// operator-presence predicate. A shift whose end is
// before its start crosses midnight; the end is read
// as next-day time.
// ==========================================

use crate::domain::settings::WeeklySchedule;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Upper bound for next-workday scans. A schedule with every day
/// disabled must not spin forever.
pub const MAX_WORKDAY_SCAN_DAYS: i64 = 30;

// ==========================================
// DayWindow - one resolved work window
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime, // strictly after start; next day for cross-midnight shifts
}

impl DayWindow {
    pub fn working_hours(&self) -> f64 {
        (self.end - self.start).num_minutes() as f64 / 60.0
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }
}

// ==========================================
// Calendar
// ==========================================
#[derive(Debug, Clone)]
pub struct Calendar {
    schedule: WeeklySchedule,
}

impl Calendar {
    pub fn new(schedule: WeeklySchedule) -> Self {
        Self { schedule }
    }

    /// Resolved work window for a calendar date, or None when the day
    /// is disabled.
    pub fn schedule_for(&self, date: NaiveDate) -> Option<DayWindow> {
        let day = self.schedule.day_for(date);
        if !day.enabled {
            return None;
        }
        let start = date.and_time(day.start_time);
        let end = if day.end_time <= day.start_time {
            // Cross-midnight shift: end belongs to the next calendar day.
            (date + Duration::days(1)).and_time(day.end_time)
        } else {
            date.and_time(day.end_time)
        };
        Some(DayWindow { date, start, end })
    }

    /// Earliest workday start at or after `from`. Returns the same
    /// day's start when `from` falls before it. None when no enabled
    /// day exists within the scan bound.
    pub fn advance_to_next_workday_start(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        for offset in 0..=MAX_WORKDAY_SCAN_DAYS {
            let date = from.date() + Duration::days(offset);
            if let Some(window) = self.schedule_for(date) {
                if window.start > from {
                    return Some(window.start);
                }
            }
        }
        None
    }

    /// The work window covering instant `t`, if any. Checks the
    /// previous date too so cross-midnight shifts are honored.
    pub fn window_containing(&self, t: NaiveDateTime) -> Option<DayWindow> {
        for date in [t.date() - Duration::days(1), t.date()] {
            if let Some(window) = self.schedule_for(date) {
                if window.contains(t) {
                    return Some(window);
                }
            }
        }
        None
    }

    /// True iff an operator is on shift at `t`.
    pub fn is_operator_present(&self, t: NaiveDateTime) -> bool {
        self.window_containing(t).is_some()
    }

    /// `t` itself when an operator is present, otherwise the next
    /// enabled day's start.
    pub fn next_operator_time(&self, t: NaiveDateTime) -> Option<NaiveDateTime> {
        if self.is_operator_present(t) {
            return Some(t);
        }
        self.advance_to_next_workday_start(t)
    }

    /// Enabled working hours per calendar day, summed over
    /// `[start_date, start_date + days)`.
    pub fn working_hours_in_range(&self, start_date: NaiveDate, days: i64) -> f64 {
        (0..days)
            .filter_map(|offset| self.schedule_for(start_date + Duration::days(offset)))
            .map(|w| w.working_hours())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::{DaySchedule, FactorySettings};
    use chrono::NaiveTime;

    fn weekday_calendar() -> Calendar {
        Calendar::new(FactorySettings::default().weekly_schedule)
    }

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn schedule_for_disabled_day_is_none() {
        let cal = weekday_calendar();
        // 2026-03-07 is a Saturday
        assert!(cal.schedule_for(NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()).is_none());
        assert!(cal.schedule_for(NaiveDate::from_ymd_opt(2026, 3, 6).unwrap()).is_some());
    }

    #[test]
    fn advance_skips_weekend() {
        let cal = weekday_calendar();
        // Friday 18:00 -> Monday 09:00
        let next = cal.advance_to_next_workday_start(dt(2026, 3, 6, 18, 0)).unwrap();
        assert_eq!(next, dt(2026, 3, 9, 9, 0));
    }

    #[test]
    fn advance_same_day_before_start() {
        let cal = weekday_calendar();
        // Monday 05:00 -> Monday 09:00
        let next = cal.advance_to_next_workday_start(dt(2026, 3, 2, 5, 0)).unwrap();
        assert_eq!(next, dt(2026, 3, 2, 9, 0));
    }

    #[test]
    fn operator_presence_is_half_open() {
        let cal = weekday_calendar();
        assert!(cal.is_operator_present(dt(2026, 3, 2, 9, 0)));
        assert!(cal.is_operator_present(dt(2026, 3, 2, 16, 59)));
        assert!(!cal.is_operator_present(dt(2026, 3, 2, 17, 0)));
        assert!(!cal.is_operator_present(dt(2026, 3, 2, 8, 59)));
    }

    #[test]
    fn next_operator_time_identity_when_present() {
        let cal = weekday_calendar();
        let t = dt(2026, 3, 2, 10, 30);
        assert_eq!(cal.next_operator_time(t), Some(t));
        assert_eq!(
            cal.next_operator_time(dt(2026, 3, 2, 20, 0)),
            Some(dt(2026, 3, 3, 9, 0))
        );
    }

    #[test]
    fn cross_midnight_shift_wraps() {
        let mut settings = FactorySettings::default();
        // Monday 22:00 -> 06:00 next morning
        settings.weekly_schedule.days[0] = DaySchedule::working(
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        );
        let cal = Calendar::new(settings.weekly_schedule);

        let window = cal.schedule_for(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()).unwrap();
        assert!((window.working_hours() - 8.0).abs() < 1e-9);
        assert_eq!(window.end, dt(2026, 3, 3, 6, 0));

        // Tuesday 02:00 belongs to Monday's night shift.
        assert!(cal.is_operator_present(dt(2026, 3, 3, 2, 0)));
    }

    #[test]
    fn all_disabled_schedule_returns_none() {
        let mut settings = FactorySettings::default();
        for day in settings.weekly_schedule.days.iter_mut() {
            *day = DaySchedule::disabled();
        }
        let cal = Calendar::new(settings.weekly_schedule);
        assert!(cal.advance_to_next_workday_start(dt(2026, 3, 2, 9, 0)).is_none());
    }
}
