//! Day rollover detection. The engine runs this before its slot scan so no
//! slot is evaluated twice across a date boundary.

use chrono::NaiveDate;

/// Tracks the last-observed calendar date.
#[derive(Debug, Default)]
pub struct DailyResetController {
    last_date: Option<NaiveDate>,
}

impl DailyResetController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `today` differs from the last-observed date. The
    /// first observation seeds without signalling a rollover.
    pub fn observe(&mut self, today: NaiveDate) -> bool {
        match self.last_date {
            None => {
                self.last_date = Some(today);
                false
            }
            Some(seen) if seen != today => {
                self.last_date = Some(today);
                true
            }
            Some(_) => false,
        }
    }
}
