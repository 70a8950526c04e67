//! The dispense state machine: IDLE → ALERTING → (TAKEN | MISSED) → IDLE.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDateTime};
use dispenser_config::SlotAssignment;
use dispenser_traits::{AlertSignal, Clock, PresenceSensor, ReleaseServo, Stepper, SystemClock};

use crate::debounce::debounced_present;
use crate::driver::ActuatorDriver;
use crate::error::{BuildError, Result};
use crate::events::{DoseEvent, EventKind, EventSink};
use crate::mapping::target_position;
use crate::reset::DailyResetController;
use crate::schedule::{SLOTS_PER_DAY, ScheduleStore};
use crate::window::DoseWindow;

/// Presence polling cadence while alerting.
pub const ALERT_POLL: Duration = Duration::from_millis(100);

/// With blocking actuation an ALERTING entry always resolves within the same
/// tick; the variant exists so an unresolved alert defers evaluation instead
/// of double-alerting another slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Alerting { day: u8, slot: u8 },
}

/// Outcome of one engine tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Nothing due this tick.
    Idle,
    /// A dose was presented and confirmed taken.
    Dispensed { day: u8, slot: u8 },
    /// A window closed without confirmation; the compartment stayed shut.
    Missed { day: u8, slot: u8 },
}

/// The tick-driven core. Sole writer of outcome flags; the daily reset it
/// hosts is the only other writer of engine-owned state.
pub struct DispenseEngine {
    store: ScheduleStore,
    driver: ActuatorDriver<Box<dyn Stepper>, Box<dyn ReleaseServo>>,
    sensor: Box<dyn PresenceSensor>,
    alert: Box<dyn AlertSignal>,
    events: Box<dyn EventSink>,
    clock: Arc<dyn Clock + Send + Sync>,
    reset: DailyResetController,
    state: EngineState,
}

impl std::fmt::Debug for DispenseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispenseEngine")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl DispenseEngine {
    /// Start building an engine.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Atomic bulk replacement from the configuration collaborator. Must only
    /// be called between ticks (single-threaded tick model makes this
    /// automatic).
    pub fn apply_schedule(&mut self, assignments: &[SlotAssignment]) {
        self.store.set_all(assignments);
    }

    pub fn schedule(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn current_position(&self) -> u8 {
        self.driver.current_position()
    }

    /// Operator-triggered re-home; the only recovery path after an
    /// interrupted rotation.
    pub fn home(&mut self) -> Result<()> {
        self.driver.home()
    }

    /// One evaluation pass. Runs the daily reset first, then scans the
    /// current day's slots in fixed index order and resolves at most one:
    /// a lapsed window is recorded as missed, a containing window alerts and
    /// blocks until taken or expired. Remaining due slots are picked up on
    /// subsequent ticks.
    pub fn tick(&mut self) -> Result<TickStatus> {
        let now = self.clock.now();
        if self.reset.observe(now.date()) {
            self.store.reset_day_flags();
            self.driver.home()?;
            tracing::info!(date = %now.date(), "daily reset: outcome flags cleared, carousel homed");
        }
        if let EngineState::Alerting { day, slot } = self.state {
            tracing::warn!(day, slot, "tick while alert unresolved; deferring scan");
            return Ok(TickStatus::Idle);
        }
        let day = day_index(now);
        for slot in 0..SLOTS_PER_DAY {
            let entry = self.store.get(day, slot);
            if !entry.pending() {
                continue;
            }
            let window = DoseWindow::for_slot(&entry, now.date());
            if window.is_past(now) {
                // Lapsed without ever alerting (e.g. eclipsed by an earlier
                // slot); still a terminal outcome.
                self.store.mark_outcome(day, slot, false);
                self.emit(EventKind::Missed, day, slot);
                tracing::info!(day, slot, "window lapsed unalerted; dose missed");
                return Ok(TickStatus::Missed {
                    day: day as u8,
                    slot: slot as u8,
                });
            }
            if window.contains(now) {
                return self.run_alert(day, slot, window);
            }
        }
        Ok(TickStatus::Idle)
    }

    /// ALERTING: signal on, poll presence until a debounced event or the
    /// window's end. The wait budget is whatever remains of the window at
    /// entry; it is recomputed here, never cached.
    fn run_alert(&mut self, day: usize, slot: usize, window: DoseWindow) -> Result<TickStatus> {
        self.state = EngineState::Alerting {
            day: day as u8,
            slot: slot as u8,
        };
        self.set_alert(true);
        tracing::info!(day, slot, until = %window.end(), "dose due; alerting");
        let taken = loop {
            match debounced_present(&mut self.sensor, &*self.clock) {
                Ok(true) => break true,
                Ok(false) => {}
                Err(e) => {
                    self.set_alert(false);
                    self.state = EngineState::Idle;
                    return Err(e);
                }
            }
            if self.clock.now() >= window.end() {
                break false;
            }
            self.clock.sleep(ALERT_POLL);
        };
        self.set_alert(false);
        self.state = EngineState::Idle;
        if taken {
            self.dispense(day, slot)
        } else {
            self.store.mark_outcome(day, slot, false);
            self.emit(EventKind::Missed, day, slot);
            tracing::info!(day, slot, "window closed; dose missed");
            Ok(TickStatus::Missed {
                day: day as u8,
                slot: slot as u8,
            })
        }
    }

    /// TAKEN: rotate to the slot's compartment, run the matched actuator's
    /// release sequence, record the outcome.
    fn dispense(&mut self, day: usize, slot: usize) -> Result<TickStatus> {
        let (position, actuator) = target_position(day, slot);
        self.driver.rotate_to(position)?;
        self.driver.release(actuator)?;
        self.store.mark_outcome(day, slot, true);
        self.emit(EventKind::Dispensed, day, slot);
        tracing::info!(day, slot, position, ?actuator, "dose dispensed");
        Ok(TickStatus::Dispensed {
            day: day as u8,
            slot: slot as u8,
        })
    }

    fn emit(&mut self, kind: EventKind, day: usize, slot: usize) {
        let event = DoseEvent {
            timestamp: self.clock.now(),
            day: day as u8,
            slot: slot as u8,
            kind,
        };
        self.events.record(&event);
    }

    // Alert signalling is fire-and-forget; a dead indicator must not block a
    // dose decision.
    fn set_alert(&mut self, on: bool) {
        if let Err(e) = self.alert.set_active(on) {
            tracing::warn!(error = %e, on, "alert signal failed");
        }
    }
}

/// Day-of-week index with Monday = 0, matching the schedule table.
fn day_index(now: NaiveDateTime) -> usize {
    now.weekday().num_days_from_monday() as usize
}

/// Builder for `DispenseEngine`. All hardware seams are mandatory; the clock
/// defaults to `SystemClock`.
#[derive(Default)]
pub struct EngineBuilder {
    stepper: Option<Box<dyn Stepper>>,
    servo_a: Option<Box<dyn ReleaseServo>>,
    servo_b: Option<Box<dyn ReleaseServo>>,
    sensor: Option<Box<dyn PresenceSensor>>,
    alert: Option<Box<dyn AlertSignal>>,
    events: Option<Box<dyn EventSink>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
}

impl EngineBuilder {
    pub fn with_stepper(mut self, stepper: impl Stepper + 'static) -> Self {
        self.stepper = Some(Box::new(stepper));
        self
    }

    /// The two flap servos: `a` serves even slots, `b` odd slots.
    pub fn with_servos(
        mut self,
        a: impl ReleaseServo + 'static,
        b: impl ReleaseServo + 'static,
    ) -> Self {
        self.servo_a = Some(Box::new(a));
        self.servo_b = Some(Box::new(b));
        self
    }

    pub fn with_sensor(mut self, sensor: impl PresenceSensor + 'static) -> Self {
        self.sensor = Some(Box::new(sensor));
        self
    }

    pub fn with_alert(mut self, alert: impl AlertSignal + 'static) -> Self {
        self.alert = Some(Box::new(alert));
        self
    }

    pub fn with_event_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.events = Some(Box::new(sink));
        self
    }

    /// Provide a custom clock implementation; defaults to SystemClock.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate and assemble the engine.
    pub fn build(self) -> Result<DispenseEngine> {
        let stepper = self
            .stepper
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStepper))?;
        let (servo_a, servo_b) = match (self.servo_a, self.servo_b) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(eyre::Report::new(BuildError::MissingServos)),
        };
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let alert = self
            .alert
            .ok_or_else(|| eyre::Report::new(BuildError::MissingAlert))?;
        let events = self
            .events
            .ok_or_else(|| eyre::Report::new(BuildError::MissingEventSink))?;
        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(SystemClock::new()),
        };
        let driver = ActuatorDriver::new(stepper, servo_a, servo_b, Arc::clone(&clock));
        Ok(DispenseEngine {
            store: ScheduleStore::new(),
            driver,
            sensor,
            alert,
            events,
            clock,
            reset: DailyResetController::new(),
            state: EngineState::Idle,
        })
    }
}
