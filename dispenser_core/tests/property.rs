use std::sync::Arc;

use chrono::NaiveDate;
use dispenser_core::mocks::{ManualClock, RecordingServo, RecordingStepper};
use dispenser_core::{ActuatorDriver, POSITIONS, ScheduleStore};
use proptest::prelude::*;

fn driver() -> (
    ActuatorDriver<RecordingStepper, RecordingServo>,
    std::sync::Arc<std::sync::Mutex<Vec<(dispenser_traits::Direction, u32)>>>,
) {
    let clock = ManualClock::starting_at(
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    );
    let stepper = RecordingStepper::new();
    let steps = stepper.log();
    let (a, b, _) = RecordingServo::pair();
    (ActuatorDriver::new(stepper, a, b, Arc::new(clock)), steps)
}

proptest! {
    /// Travel never exceeds half the circle, and the recorded position always
    /// lands on the commanded target.
    #[test]
    fn rotation_is_shortest_path(targets in prop::collection::vec(0u8..POSITIONS, 1..40)) {
        let (mut driver, steps) = driver();
        for &target in &targets {
            let before = driver.current_position();
            steps.lock().unwrap().clear();
            driver.rotate_to(target).unwrap();
            prop_assert_eq!(driver.current_position(), target);

            let log = steps.lock().unwrap();
            if target == before {
                prop_assert!(log.is_empty());
            } else {
                prop_assert_eq!(log.len(), 1);
                let (_, pulses) = log[0];
                prop_assert!(pulses <= u32::from(POSITIONS) / 2, "{} steps from {} to {}", pulses, before, target);
                prop_assert!(pulses > 0);
            }
        }
    }

    /// Repeating the last rotation is always a no-op.
    #[test]
    fn rotation_is_idempotent(target in 0u8..POSITIONS) {
        let (mut driver, steps) = driver();
        driver.rotate_to(target).unwrap();
        steps.lock().unwrap().clear();
        driver.rotate_to(target).unwrap();
        prop_assert!(steps.lock().unwrap().is_empty());
    }

    /// dispensed and missed are never simultaneously true, whatever outcome
    /// sequence the engine records.
    #[test]
    fn outcome_flags_stay_exclusive(outcomes in prop::collection::vec(prop::option::of(any::<bool>()), 42)) {
        let mut store = ScheduleStore::new();
        for (i, outcome) in outcomes.iter().enumerate() {
            if let Some(dispensed) = outcome {
                store.mark_outcome(i / 6, i % 6, *dispensed);
            }
        }
        for day in 0..7 {
            for slot in 0..6 {
                let s = store.get(day, slot);
                prop_assert!(!(s.dispensed && s.missed));
            }
        }
    }
}
