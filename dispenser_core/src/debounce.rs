//! Presence confirmation: a single transient high reading is never trusted.

use std::time::Duration;

use dispenser_traits::{Clock, PresenceSensor};

use crate::driver::map_hw_error_dyn;
use crate::error::Result;

/// Delay between the two confirming reads.
pub const DEBOUNCE_RECHECK: Duration = Duration::from_millis(200);

/// Debounced presence read: true only when two reads separated by
/// `DEBOUNCE_RECHECK` both report the signal high.
pub fn debounced_present<S: PresenceSensor + ?Sized>(
    sensor: &mut S,
    clock: &dyn Clock,
) -> Result<bool> {
    let first = sensor
        .level()
        .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))?;
    if !first {
        return Ok(false);
    }
    clock.sleep(DEBOUNCE_RECHECK);
    let second = sensor
        .level()
        .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))?;
    if !second {
        tracing::trace!("presence flicker rejected by debounce");
    }
    Ok(second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{ManualClock, ScriptedPresence};
    use chrono::NaiveDate;

    fn clock() -> ManualClock {
        ManualClock::starting_at(
            NaiveDate::from_ymd_opt(2024, 7, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn low_level_returns_immediately() {
        let clock = clock();
        let before = clock.now();
        let mut sensor = ScriptedPresence::new([false]);
        assert!(!debounced_present(&mut sensor, &clock).unwrap());
        assert_eq!(clock.now(), before, "no recheck delay on a low read");
    }

    #[test]
    fn transient_high_is_rejected() {
        let clock = clock();
        let mut sensor = ScriptedPresence::new([true, false]);
        assert!(!debounced_present(&mut sensor, &clock).unwrap());
    }

    #[test]
    fn stable_high_is_accepted_after_recheck() {
        let clock = clock();
        let before = clock.now();
        let mut sensor = ScriptedPresence::new([true, true]);
        assert!(debounced_present(&mut sensor, &clock).unwrap());
        let elapsed = clock.now() - before;
        assert_eq!(elapsed.num_milliseconds(), 200);
    }
}
