//! Raspberry Pi GPIO implementations of the hardware traits.

use std::thread::sleep;
use std::time::Duration;

use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::pwm::{Polarity, Pwm};
pub use rppal::pwm::Channel;

use crate::error::HwError;
use dispenser_traits::{AlertSignal, Direction, PresenceSensor, ReleaseServo, Stepper};

/// Half-period of one step pulse; the driver has no feedback path, timing is
/// the only contract.
const STEP_HALF_PERIOD: Duration = Duration::from_micros(500);

/// Standard hobby-servo PWM frame.
const SERVO_PERIOD: Duration = Duration::from_millis(20);
const SERVO_OPEN_PULSE: Duration = Duration::from_micros(2000);
const SERVO_CLOSED_PULSE: Duration = Duration::from_micros(1000);

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

fn pwm_err(e: rppal::pwm::Error) -> HwError {
    HwError::Pwm(e.to_string())
}

pub struct GpioStepper {
    step: OutputPin,
    dir: OutputPin,
}

impl GpioStepper {
    pub fn new(step_pin: u8, dir_pin: u8) -> Result<Self, HwError> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let step = gpio.get(step_pin).map_err(gpio_err)?.into_output();
        let dir = gpio.get(dir_pin).map_err(gpio_err)?.into_output();
        Ok(GpioStepper { step, dir })
    }
}

impl Stepper for GpioStepper {
    fn step(
        &mut self,
        dir: Direction,
        pulses: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match dir {
            Direction::Forward => self.dir.set_high(),
            Direction::Reverse => self.dir.set_low(),
        }
        for _ in 0..pulses {
            self.step.set_high();
            sleep(STEP_HALF_PERIOD);
            self.step.set_low();
            sleep(STEP_HALF_PERIOD);
        }
        tracing::debug!(?dir, pulses, "stepper pulse train done");
        Ok(())
    }
}

pub struct PwmServo {
    pwm: Pwm,
}

impl PwmServo {
    pub fn new(channel: Channel) -> Result<Self, HwError> {
        let pwm = Pwm::with_period(
            channel,
            SERVO_PERIOD,
            SERVO_CLOSED_PULSE,
            Polarity::Normal,
            true,
        )
        .map_err(pwm_err)?;
        Ok(PwmServo { pwm })
    }
}

impl ReleaseServo for PwmServo {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pwm
            .set_pulse_width(SERVO_OPEN_PULSE)
            .map_err(|e| Box::new(pwm_err(e)) as _)
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pwm
            .set_pulse_width(SERVO_CLOSED_PULSE)
            .map_err(|e| Box::new(pwm_err(e)) as _)
    }
}

pub struct GpioPresence {
    pin: InputPin,
    active_low: bool,
}

impl GpioPresence {
    pub fn new(pin: u8, active_low: bool) -> Result<Self, HwError> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let pin = gpio.get(pin).map_err(gpio_err)?.into_input_pullup();
        Ok(GpioPresence { pin, active_low })
    }
}

impl PresenceSensor for GpioPresence {
    fn level(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let raw = self.pin.is_high();
        Ok(raw != self.active_low)
    }
}

pub struct GpioAlert {
    pin: OutputPin,
}

impl GpioAlert {
    pub fn new(pin: u8) -> Result<Self, HwError> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let pin = gpio.get(pin).map_err(gpio_err)?.into_output();
        Ok(GpioAlert { pin })
    }
}

impl AlertSignal for GpioAlert {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}
