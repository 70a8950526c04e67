pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;

use std::cell::Cell;
use std::rc::Rc;

use dispenser_traits::{AlertSignal, Direction, PresenceSensor, ReleaseServo, Stepper};

/// Simulated carousel stepper. Counts pulses instead of moving anything.
pub struct SimulatedStepper {
    pulses: Rc<Cell<u32>>,
}

impl SimulatedStepper {
    pub fn new() -> Self {
        SimulatedStepper {
            pulses: Rc::new(Cell::new(0)),
        }
    }

    /// Shared pulse counter, readable after the stepper is moved into a driver.
    pub fn pulse_counter(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.pulses)
    }
}

impl Default for SimulatedStepper {
    fn default() -> Self {
        Self::new()
    }
}

impl Stepper for SimulatedStepper {
    fn step(
        &mut self,
        dir: Direction,
        pulses: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pulses.set(self.pulses.get().saturating_add(pulses));
        tracing::debug!(?dir, pulses, "stepper pulses (simulated)");
        Ok(())
    }
}

/// Simulated release servo.
pub struct SimulatedServo {
    name: &'static str,
}

impl SimulatedServo {
    pub fn new(name: &'static str) -> Self {
        SimulatedServo { name }
    }
}

impl ReleaseServo for SimulatedServo {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(servo = self.name, "servo open (simulated)");
        Ok(())
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(servo = self.name, "servo close (simulated)");
        Ok(())
    }
}

/// Simulated dose-removed sensor.
///
/// The level can be driven externally through `handle()`, or the sensor can
/// flip itself high after a fixed number of reads (`present_after`) so a
/// dev-host run resolves doses without anyone at the tray.
pub struct SimulatedPresence {
    level: Rc<Cell<bool>>,
    present_after: Option<u32>,
    reads: u32,
}

impl SimulatedPresence {
    pub fn new() -> Self {
        SimulatedPresence {
            level: Rc::new(Cell::new(false)),
            present_after: None,
            reads: 0,
        }
    }

    /// Sensor that reports presence once it has been read `reads` times.
    pub fn present_after(reads: u32) -> Self {
        SimulatedPresence {
            level: Rc::new(Cell::new(false)),
            present_after: Some(reads),
            reads: 0,
        }
    }

    /// Shared level handle for driving the signal from the outside.
    pub fn handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.level)
    }
}

impl Default for SimulatedPresence {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceSensor for SimulatedPresence {
    fn level(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(n) = self.present_after {
            self.reads = self.reads.saturating_add(1);
            if self.reads > n {
                self.level.set(true);
            }
        }
        Ok(self.level.get())
    }
}

/// Simulated alert indicator.
pub struct SimulatedAlert {
    active: Rc<Cell<bool>>,
}

impl SimulatedAlert {
    pub fn new() -> Self {
        SimulatedAlert {
            active: Rc::new(Cell::new(false)),
        }
    }

    pub fn handle(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.active)
    }
}

impl Default for SimulatedAlert {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSignal for SimulatedAlert {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.active.set(on);
        tracing::debug!(on, "alert signal (simulated)");
        Ok(())
    }
}
