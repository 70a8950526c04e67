//! Dose window math: the interval during which a scheduled dose is
//! deliverable. Derived fresh on every evaluation, never stored.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::schedule::ScheduleSlot;

/// Seconds the window opens before the scheduled time.
pub const PRE_WINDOW_SECS: i64 = 0;
/// Seconds the window stays open after the scheduled time.
pub const POST_WINDOW_SECS: i64 = 1800;

/// Closed interval `[scheduled - PRE, scheduled + POST]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoseWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DoseWindow {
    /// Window for `slot` on `date`. Slot times are boundary-validated, so an
    /// unrepresentable hour/minute can only come from a caller bug.
    pub fn for_slot(slot: &ScheduleSlot, date: NaiveDate) -> Self {
        debug_assert!(slot.hour < 24 && slot.minute < 60, "slot time out of range");
        let time = NaiveTime::from_hms_opt(u32::from(slot.hour), u32::from(slot.minute), 0)
            .unwrap_or(NaiveTime::MIN);
        let scheduled = date.and_time(time);
        Self {
            start: scheduled - Duration::seconds(PRE_WINDOW_SECS),
            end: scheduled + Duration::seconds(POST_WINDOW_SECS),
        }
    }

    pub fn contains(&self, now: NaiveDateTime) -> bool {
        self.start <= now && now <= self.end
    }

    /// The window has closed without containing `now`.
    pub fn is_past(&self, now: NaiveDateTime) -> bool {
        now > self.end
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot_at(hour: u8, minute: u8) -> ScheduleSlot {
        ScheduleSlot {
            hour,
            minute,
            active: true,
            dispensed: false,
            missed: false,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let w = DoseWindow::for_slot(&slot_at(8, 0), date());
        let t = date().and_hms_opt(8, 0, 0).unwrap();
        assert!(!w.contains(t - Duration::seconds(1)));
        assert!(w.contains(t));
        assert!(w.contains(t + Duration::seconds(POST_WINDOW_SECS)));
        assert!(!w.contains(t + Duration::seconds(POST_WINDOW_SECS + 1)));
    }

    #[test]
    fn is_past_only_after_end() {
        let w = DoseWindow::for_slot(&slot_at(8, 0), date());
        let end = date().and_hms_opt(8, 30, 0).unwrap();
        assert!(!w.is_past(end));
        assert!(w.is_past(end + Duration::seconds(1)));
    }

    #[test]
    fn late_evening_slot_stays_on_its_date() {
        let w = DoseWindow::for_slot(&slot_at(23, 45), date());
        // Window may spill past midnight; start stays on the evaluation date.
        assert!(w.contains(date().and_hms_opt(23, 59, 59).unwrap()));
        let next = date().succ_opt().unwrap();
        assert!(w.contains(next.and_hms_opt(0, 10, 0).unwrap()));
        assert!(w.is_past(next.and_hms_opt(0, 16, 0).unwrap()));
    }
}
