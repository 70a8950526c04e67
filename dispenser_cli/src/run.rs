//! Hardware assembly, schedule loading, and the tick loop.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dispenser_config::SlotAssignment;
use dispenser_core::error::Result;
use dispenser_core::{Actuator, ActuatorDriver, DispenseEngine, FileEventLog, TickStatus, target_position};
use dispenser_traits::{AlertSignal, Clock, PresenceSensor, ReleaseServo, Stepper, SystemClock};
use eyre::WrapErr;

/// Boxed device set, either simulated or real depending on build features.
struct Devices {
    stepper: Box<dyn Stepper>,
    servo_a: Box<dyn ReleaseServo>,
    servo_b: Box<dyn ReleaseServo>,
    sensor: Box<dyn PresenceSensor>,
    alert: Box<dyn AlertSignal>,
}

// GPIO wiring for the hardware build. The carousel stepper, one servo per
// flap bank, the tray IR sensor, and the alert lamp.
#[cfg(all(feature = "hardware", target_os = "linux"))]
mod pins {
    pub const STEP: u8 = 13;
    pub const DIR: u8 = 19;
    pub const PRESENCE: u8 = 5;
    pub const PRESENCE_ACTIVE_LOW: bool = true;
    pub const ALERT: u8 = 26;
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn devices() -> Result<Devices> {
    use dispenser_hardware::gpio::{Channel, GpioAlert, GpioPresence, GpioStepper, PwmServo};

    Ok(Devices {
        stepper: Box::new(GpioStepper::new(pins::STEP, pins::DIR)?),
        servo_a: Box::new(PwmServo::new(Channel::Pwm0)?),
        servo_b: Box::new(PwmServo::new(Channel::Pwm1)?),
        sensor: Box::new(GpioPresence::new(pins::PRESENCE, pins::PRESENCE_ACTIVE_LOW)?),
        alert: Box::new(GpioAlert::new(pins::ALERT)?),
    })
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn devices() -> Result<Devices> {
    use dispenser_hardware::{SimulatedAlert, SimulatedPresence, SimulatedServo, SimulatedStepper};

    Ok(Devices {
        stepper: Box::new(SimulatedStepper::new()),
        servo_a: Box::new(SimulatedServo::new("A")),
        servo_b: Box::new(SimulatedServo::new("B")),
        // The sim tray reports the dose removed after a few polls so alerts
        // resolve on a dev host.
        sensor: Box::new(SimulatedPresence::present_after(3)),
        alert: Box::new(SimulatedAlert::new()),
    })
}

/// Load and validate a schedule document; CSV is selected by extension.
pub fn load_schedule(path: &Path) -> Result<Vec<SlotAssignment>> {
    let file = match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => {
            let reader = fs::File::open(path)
                .wrap_err_with(|| format!("opening schedule {}", path.display()))?;
            dispenser_config::read_csv_schedule(reader)?
        }
        _ => {
            let content = fs::read_to_string(path)
                .wrap_err_with(|| format!("reading schedule {}", path.display()))?;
            dispenser_config::load_toml(&content).wrap_err("parsing schedule TOML")?
        }
    };
    file.validate()
}

fn build_engine(event_log: &Path) -> Result<DispenseEngine> {
    let devices = devices()?;
    DispenseEngine::builder()
        .with_stepper(devices.stepper)
        .with_servos(devices.servo_a, devices.servo_b)
        .with_sensor(devices.sensor)
        .with_alert(devices.alert)
        .with_event_sink(FileEventLog::new(event_log))
        .build()
}

/// The dispenser main loop: one engine tick per interval until Ctrl-C (or
/// `max_ticks` in test runs).
pub fn run(schedule: &Path, tick_ms: u64, event_log: &Path, max_ticks: u64) -> Result<()> {
    let assignments = load_schedule(schedule)?;
    let mut engine = build_engine(event_log)?;
    engine.apply_schedule(&assignments);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .wrap_err("installing Ctrl-C handler")?;
    }

    tracing::info!(
        entries = assignments.len(),
        tick_ms,
        event_log = %event_log.display(),
        "dispenser loop started"
    );
    let mut ticks = 0u64;
    while !shutdown.load(Ordering::SeqCst) {
        match engine.tick()? {
            TickStatus::Idle => {}
            TickStatus::Dispensed { day, slot } => {
                tracing::info!(day, slot, "dose dispensed");
            }
            TickStatus::Missed { day, slot } => {
                tracing::warn!(day, slot, "dose missed");
            }
        }
        ticks += 1;
        if max_ticks > 0 && ticks >= max_ticks {
            break;
        }
        std::thread::sleep(Duration::from_millis(tick_ms));
    }
    tracing::info!(ticks, "dispenser loop stopped");
    Ok(())
}

/// Exercise every device once and report.
pub fn self_check() -> Result<()> {
    let devices = devices()?;
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock::new());
    let mut driver = ActuatorDriver::new(
        devices.stepper,
        devices.servo_a,
        devices.servo_b,
        Arc::clone(&clock),
    );
    driver.rotate_to(0)?;
    driver.home()?;
    driver.release(Actuator::A)?;
    driver.release(Actuator::B)?;

    let mut sensor = devices.sensor;
    let level = sensor
        .level()
        .map_err(|e| eyre::eyre!("presence sensor: {e}"))?;
    tracing::debug!(level, "presence sensor read");

    let mut alert = devices.alert;
    alert
        .set_active(true)
        .and_then(|()| alert.set_active(false))
        .map_err(|e| eyre::eyre!("alert signal: {e}"))?;

    println!("OK");
    Ok(())
}

/// Operator-triggered re-home, the manual recovery path after a suspected
/// interrupted rotation.
pub fn home() -> Result<()> {
    let devices = devices()?;
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock::new());
    let mut driver = ActuatorDriver::new(
        devices.stepper,
        devices.servo_a,
        devices.servo_b,
        Arc::clone(&clock),
    );
    driver.home()?;
    println!("carousel at position {}", driver.current_position());
    Ok(())
}

/// Load, validate and print the resolved schedule with physical addressing.
pub fn print_schedule(path: &Path) -> Result<()> {
    let assignments = load_schedule(path)?;
    println!("{} configured dose(s) in {}", assignments.len(), path.display());
    for a in &assignments {
        let (position, actuator) = target_position(a.day as usize, a.slot as usize);
        println!(
            "day {} slot {} at {:02}:{:02} -> compartment {position} actuator {actuator:?} [{}]",
            a.day,
            a.slot,
            a.hour,
            a.minute,
            if a.active { "active" } else { "inactive" },
        );
    }
    Ok(())
}
