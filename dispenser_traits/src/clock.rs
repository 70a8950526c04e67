use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;

/// Wall-clock abstraction for scheduling and timing across the stack.
///
/// - now(): returns the current local date-time (calendar fields and epoch
///   seconds both derive from it)
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - epoch_secs(): helper converting now() to Unix epoch seconds
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
    fn sleep(&self, d: Duration);

    /// Unix epoch seconds for the current reading.
    fn epoch_secs(&self) -> i64 {
        self.now().and_utc().timestamp()
    }
}

/// Default real-time clock backed by the system's local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}
