use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DispenseError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing stepper")]
    MissingStepper,
    #[error("missing release servos")]
    MissingServos,
    #[error("missing presence sensor")]
    MissingSensor,
    #[error("missing alert signal")]
    MissingAlert,
    #[error("missing event sink")]
    MissingEventSink,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
