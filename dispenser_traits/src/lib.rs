pub mod clock;

pub use clock::{Clock, SystemClock};

/// Carousel rotation direction as seen from the dispenser front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

pub trait Stepper {
    /// Issue `pulses` discrete step pulses in `dir`. Blocks until the full
    /// pulse train has been emitted; there is no completion feedback beyond
    /// elapsed time.
    fn step(
        &mut self,
        dir: Direction,
        pulses: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub trait ReleaseServo {
    /// Drive the flap to its fixed open angle.
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Return the flap to its fixed closed angle.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub trait PresenceSensor {
    /// One raw read of the dose-removed signal. Debouncing is the caller's
    /// concern; a single high level must not be trusted.
    fn level(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

pub trait AlertSignal {
    /// Switch the external indicator (light/sound) on or off. Fire-and-forget;
    /// there is no acknowledgment path.
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: Stepper + ?Sized> Stepper for Box<T> {
    fn step(
        &mut self,
        dir: Direction,
        pulses: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).step(dir, pulses)
    }
}

impl<T: ReleaseServo + ?Sized> ReleaseServo for Box<T> {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).open()
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }
}

impl<T: PresenceSensor + ?Sized> PresenceSensor for Box<T> {
    fn level(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        (**self).level()
    }
}

impl<T: AlertSignal + ?Sized> AlertSignal for Box<T> {
    fn set_active(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_active(on)
    }
}
