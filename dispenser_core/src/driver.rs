//! Carousel and flap actuation. Both operations block: the hardware has no
//! completion feedback other than elapsed time.

use std::sync::Arc;
use std::time::Duration;

use dispenser_traits::{Clock, Direction, ReleaseServo, Stepper};
use eyre::WrapErr;

use crate::error::{DispenseError, Result};
use crate::mapping::{Actuator, HOME_POSITION, POSITIONS};

/// How long a flap is held open before closing.
pub const RELEASE_DWELL: Duration = Duration::from_millis(800);

/// Owns the carousel position and the two flap servos. The position field is
/// the single source of truth for where the carousel sits; nothing else may
/// mutate it. An interrupted rotation leaves it stale (no partial commits);
/// the recorded position stays authoritative until the next re-home.
pub struct ActuatorDriver<St, Sv> {
    stepper: St,
    servo_a: Sv,
    servo_b: Sv,
    clock: Arc<dyn Clock + Send + Sync>,
    current: u8,
}

impl<St: Stepper, Sv: ReleaseServo> ActuatorDriver<St, Sv> {
    /// The carousel is expected to rest at the home index at process start;
    /// the first daily rollover re-homes unconditionally either way.
    pub fn new(stepper: St, servo_a: Sv, servo_b: Sv, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            stepper,
            servo_a,
            servo_b,
            clock,
            current: HOME_POSITION,
        }
    }

    pub fn current_position(&self) -> u8 {
        self.current
    }

    /// Rotate to `target` along the signed shortest path, wrapping at the
    /// half-circle boundary. No-op when already there. The position is
    /// committed only after the full pulse train returns.
    pub fn rotate_to(&mut self, target: u8) -> Result<()> {
        debug_assert!(target < POSITIONS, "carousel target out of range");
        if target >= POSITIONS || target == self.current {
            return Ok(());
        }
        let diff = shortest_diff(self.current, target);
        let (dir, pulses) = if diff >= 0 {
            (Direction::Forward, diff as u32)
        } else {
            (Direction::Reverse, (-diff) as u32)
        };
        self.stepper
            .step(dir, pulses)
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("carousel rotation")?;
        tracing::debug!(from = self.current, to = target, pulses, ?dir, "carousel rotated");
        self.current = target;
        Ok(())
    }

    /// Open the matched flap, hold for the fixed dwell, close it again.
    pub fn release(&mut self, actuator: Actuator) -> Result<()> {
        let servo = match actuator {
            Actuator::A => &mut self.servo_a,
            Actuator::B => &mut self.servo_b,
        };
        servo
            .open()
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("flap open")?;
        self.clock.sleep(RELEASE_DWELL);
        servo
            .close()
            .map_err(|e| eyre::Report::new(map_hw_error_dyn(&*e)))
            .wrap_err("flap close")?;
        tracing::debug!(?actuator, "release sequence complete");
        Ok(())
    }

    /// Return the carousel to its rest index.
    pub fn home(&mut self) -> Result<()> {
        self.rotate_to(HOME_POSITION)
    }
}

/// Signed shortest-path step count from `current` to `target` over the
/// circular position space: `((target - current + P/2) mod P) - P/2`.
/// Result is within `[-P/2, P/2 - 1]`, so travel never exceeds `P/2` steps.
pub fn shortest_diff(current: u8, target: u8) -> i16 {
    let p = i16::from(POSITIONS);
    let half = p / 2;
    (i16::from(target) - i16::from(current) + half).rem_euclid(p) - half
}

// Map any boxed hardware error to a typed DispenseError, with special
// handling for the hardware crate's typed errors when the feature is on.
pub(crate) fn map_hw_error_dyn(e: &(dyn std::error::Error + 'static)) -> DispenseError {
    #[cfg(feature = "hardware-errors")]
    if let Some(hw) = e.downcast_ref::<dispenser_hardware::error::HwError>() {
        return DispenseError::HardwareFault(hw.to_string());
    }
    DispenseError::Hardware(e.to_string())
}
