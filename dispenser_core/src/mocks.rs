//! Test and helper mocks for dispenser_core

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDateTime;
use dispenser_traits::{AlertSignal, Clock, Direction, PresenceSensor, ReleaseServo, Stepper};

use crate::events::{DoseEvent, EventSink};

/// Deterministic wall clock whose time is advanced manually or by `sleep`.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn starting_at(t: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(t)),
        }
    }

    pub fn set(&self, t: NaiveDateTime) {
        if let Ok(mut now) = self.now.lock() {
            *now = t;
        }
    }

    pub fn advance(&self, d: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += chrono::Duration::from_std(d).unwrap_or(chrono::Duration::zero());
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now
            .lock()
            .map(|g| *g)
            .unwrap_or(NaiveDateTime::default())
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

/// Stepper that records every pulse train it is asked to emit.
pub struct RecordingStepper {
    log: Arc<Mutex<Vec<(Direction, u32)>>>,
}

impl RecordingStepper {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared log handle, readable after the stepper moves into a driver.
    pub fn log(&self) -> Arc<Mutex<Vec<(Direction, u32)>>> {
        Arc::clone(&self.log)
    }
}

impl Default for RecordingStepper {
    fn default() -> Self {
        Self::new()
    }
}

impl Stepper for RecordingStepper {
    fn step(
        &mut self,
        dir: Direction,
        pulses: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut log) = self.log.lock() {
            log.push((dir, pulses));
        }
        Ok(())
    }
}

/// Stepper that always fails; useful for error-path tests.
pub struct FailingStepper;

impl Stepper for FailingStepper {
    fn step(
        &mut self,
        _dir: Direction,
        _pulses: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err("stepper fault".into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoAction {
    Open,
    Close,
}

/// Servo that records open/close calls under a label.
pub struct RecordingServo {
    label: &'static str,
    log: Arc<Mutex<Vec<(&'static str, ServoAction)>>>,
}

impl RecordingServo {
    /// A pair of servos sharing one action log.
    pub fn pair() -> (Self, Self, Arc<Mutex<Vec<(&'static str, ServoAction)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = Self {
            label: "A",
            log: Arc::clone(&log),
        };
        let b = Self {
            label: "B",
            log: Arc::clone(&log),
        };
        (a, b, log)
    }
}

impl ReleaseServo for RecordingServo {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut log) = self.log.lock() {
            log.push((self.label, ServoAction::Open));
        }
        Ok(())
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut log) = self.log.lock() {
            log.push((self.label, ServoAction::Close));
        }
        Ok(())
    }
}

/// Presence sensor that replays a fixed sequence, then repeats the last value.
pub struct ScriptedPresence {
    seq: Vec<bool>,
    idx: usize,
}

impl ScriptedPresence {
    pub fn new(seq: impl Into<Vec<bool>>) -> Self {
        Self {
            seq: seq.into(),
            idx: 0,
        }
    }
}

impl PresenceSensor for ScriptedPresence {
    fn level(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let v = if self.idx < self.seq.len() {
            let x = self.seq[self.idx];
            self.idx += 1;
            x
        } else {
            self.seq.last().copied().unwrap_or(false)
        };
        Ok(v)
    }
}

/// Alert signal that records every on/off transition.
pub struct RecordingAlert {
    states: Arc<Mutex<Vec<bool>>>,
}

impl RecordingAlert {
    pub fn new() -> Self {
        Self {
            states: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn states(&self) -> Arc<Mutex<Vec<bool>>> {
        Arc::clone(&self.states)
    }
}

impl Default for RecordingAlert {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSignal for RecordingAlert {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut states) = self.states.lock() {
            states.push(on);
        }
        Ok(())
    }
}

/// Event sink collecting rendered records in memory.
pub struct MemoryEventLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn lines(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.lines)
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for MemoryEventLog {
    fn record(&mut self, event: &DoseEvent) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(event.to_record());
        }
    }
}
