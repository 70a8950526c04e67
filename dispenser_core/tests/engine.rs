use std::error::Error;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use dispenser_config::SlotAssignment;
use dispenser_core::mocks::{
    ManualClock, MemoryEventLog, RecordingAlert, RecordingServo, RecordingStepper,
    ScriptedPresence,
};
use dispenser_core::{DispenseEngine, TickStatus};
use dispenser_traits::{Direction, PresenceSensor};

/// 2024-07-01 is a Monday, so day index 0.
fn monday_at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn assignment(day: u8, slot: u8, hour: u8, minute: u8) -> SlotAssignment {
    SlotAssignment {
        day,
        slot,
        hour,
        minute,
        active: true,
    }
}

struct Harness {
    engine: DispenseEngine,
    clock: ManualClock,
    lines: Arc<Mutex<Vec<String>>>,
    alerts: Arc<Mutex<Vec<bool>>>,
    steps: Arc<Mutex<Vec<(Direction, u32)>>>,
}

fn harness(start: NaiveDateTime, sensor: impl PresenceSensor + 'static) -> Harness {
    let clock = ManualClock::starting_at(start);
    let stepper = RecordingStepper::new();
    let steps = stepper.log();
    let (a, b, _) = RecordingServo::pair();
    let alert = RecordingAlert::new();
    let alerts = alert.states();
    let sink = MemoryEventLog::new();
    let lines = sink.lines();
    let engine = DispenseEngine::builder()
        .with_stepper(stepper)
        .with_servos(a, b)
        .with_sensor(sensor)
        .with_alert(alert)
        .with_event_sink(sink)
        .with_clock(Box::new(clock.clone()))
        .build()
        .expect("build engine");
    Harness {
        engine,
        clock,
        lines,
        alerts,
        steps,
    }
}

#[test]
fn due_slot_alerts_and_dispenses_on_presence() {
    // Presence appears at the 51st poll, i.e. five seconds into the window.
    let mut script = vec![false; 50];
    script.push(true);
    let mut h = harness(monday_at(8, 0, 0), ScriptedPresence::new(script));
    h.engine.apply_schedule(&[assignment(0, 0, 8, 0)]);

    let status = h.engine.tick().expect("tick");
    assert_eq!(status, TickStatus::Dispensed { day: 0, slot: 0 });

    let slot = h.engine.schedule().get(0, 0);
    assert!(slot.dispensed && !slot.missed);

    let lines = h.lines.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("2024-07-01 08:00:0"), "got {}", lines[0]);
    assert!(lines[0].ends_with(",0,0,DISPENSED"), "got {}", lines[0]);

    // Alert went on at entry and off at exit.
    assert_eq!(h.alerts.lock().unwrap().as_slice(), &[true, false]);
    // Carousel moved off home to compartment 0.
    assert_eq!(h.steps.lock().unwrap().as_slice(), &[(Direction::Forward, 1)]);
    assert_eq!(h.engine.current_position(), 0);
}

#[test]
fn unconfirmed_window_closes_as_missed_without_actuation() {
    let mut h = harness(monday_at(8, 0, 0), ScriptedPresence::new([false]));
    h.engine.apply_schedule(&[assignment(0, 0, 8, 0)]);

    let status = h.engine.tick().expect("tick");
    assert_eq!(status, TickStatus::Missed { day: 0, slot: 0 });

    let slot = h.engine.schedule().get(0, 0);
    assert!(slot.missed && !slot.dispensed);
    // The compartment is never opened on a miss.
    assert!(h.steps.lock().unwrap().is_empty());
    assert_eq!(
        h.lines.lock().unwrap().as_slice(),
        &["2024-07-01 08:30:00,0,0,MISSED".to_string()]
    );

    // Re-scan later the same day: the slot is spent, no re-alert.
    h.clock.set(monday_at(8, 40, 0));
    assert_eq!(h.engine.tick().expect("tick"), TickStatus::Idle);
    assert_eq!(h.alerts.lock().unwrap().as_slice(), &[true, false]);
}

#[test]
fn overlapping_windows_resolve_lowest_slot_first() {
    let mut h = harness(monday_at(8, 15, 0), ScriptedPresence::new([true]));
    h.engine
        .apply_schedule(&[assignment(0, 0, 8, 0), assignment(0, 1, 8, 10)]);

    assert_eq!(
        h.engine.tick().expect("first tick"),
        TickStatus::Dispensed { day: 0, slot: 0 }
    );
    // The second due slot is picked up on the next tick.
    assert_eq!(
        h.engine.tick().expect("second tick"),
        TickStatus::Dispensed { day: 0, slot: 1 }
    );
}

#[test]
fn lapsed_window_is_missed_by_the_idle_scan() {
    let mut h = harness(monday_at(9, 0, 0), ScriptedPresence::new([true]));
    h.engine.apply_schedule(&[assignment(0, 0, 8, 0)]);

    let status = h.engine.tick().expect("tick");
    assert_eq!(status, TickStatus::Missed { day: 0, slot: 0 });
    // Closed without ever alerting.
    assert!(h.alerts.lock().unwrap().is_empty());
    let lines = h.lines.lock().unwrap();
    assert!(lines[0].ends_with(",0,0,MISSED"));
}

#[test]
fn slots_for_other_days_are_ignored() {
    let mut h = harness(monday_at(8, 5, 0), ScriptedPresence::new([true]));
    // Tuesday's slot, same time of day.
    h.engine.apply_schedule(&[assignment(1, 0, 8, 0)]);
    assert_eq!(h.engine.tick().expect("tick"), TickStatus::Idle);
}

#[test]
fn inactive_slots_are_never_evaluated() {
    let mut h = harness(monday_at(8, 5, 0), ScriptedPresence::new([true]));
    h.engine.apply_schedule(&[SlotAssignment {
        day: 0,
        slot: 0,
        hour: 8,
        minute: 0,
        active: false,
    }]);
    assert_eq!(h.engine.tick().expect("tick"), TickStatus::Idle);
    assert!(h.alerts.lock().unwrap().is_empty());
}

#[test]
fn window_opens_exactly_at_scheduled_time() {
    let mut h = harness(monday_at(7, 59, 59), ScriptedPresence::new([true]));
    h.engine.apply_schedule(&[assignment(0, 0, 8, 0)]);

    // One second before the scheduled time: outside (pre-window is zero).
    assert_eq!(h.engine.tick().expect("early tick"), TickStatus::Idle);

    h.clock.set(monday_at(8, 0, 0));
    assert_eq!(
        h.engine.tick().expect("on-time tick"),
        TickStatus::Dispensed { day: 0, slot: 0 }
    );
}

#[test]
fn sensor_fault_surfaces_and_clears_the_alert() {
    struct ErrSensor;
    impl PresenceSensor for ErrSensor {
        fn level(&mut self) -> Result<bool, Box<dyn Error + Send + Sync>> {
            Err("sensor fault".into())
        }
    }

    let mut h = harness(monday_at(8, 0, 0), ErrSensor);
    h.engine.apply_schedule(&[assignment(0, 0, 8, 0)]);

    let err = h.engine.tick().expect_err("sensor fault should surface");
    assert!(format!("{err:#}").contains("hardware"));
    // The alert is still switched off on the error path.
    assert_eq!(h.alerts.lock().unwrap().as_slice(), &[true, false]);
}

#[test]
fn builder_rejects_missing_components() {
    let err = DispenseEngine::builder()
        .with_stepper(RecordingStepper::new())
        .build()
        .expect_err("servos are mandatory");
    assert!(format!("{err}").contains("missing release servos"));

    let (a, b, _) = RecordingServo::pair();
    let err = DispenseEngine::builder()
        .with_stepper(RecordingStepper::new())
        .with_servos(a, b)
        .build()
        .expect_err("sensor is mandatory");
    assert!(format!("{err}").contains("missing presence sensor"));
}
