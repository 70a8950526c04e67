#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Dose-scheduling and dispense state machine (hardware-agnostic).
//!
//! All hardware interactions go through the `dispenser_traits` seam traits;
//! the external collaborators (configuration intake, event log, alert
//! indicator, clock) are reached through narrow interfaces.
//!
//! ## Architecture
//!
//! - **Schedule**: fixed 7×6 slot table with outcome flags (`schedule`)
//! - **Mapping**: (day, slot) → compartment index + actuator (`mapping`)
//! - **Actuation**: shortest-path rotation and flap release (`driver`)
//! - **Confirmation**: debounced presence detection (`debounce`)
//! - **Engine**: the IDLE/ALERTING/TAKEN/MISSED machine (`engine`)
//! - **Reset**: day-rollover flag clearing and re-home (`reset`)
//! - **Events**: append-only outcome records (`events`)

// Module declarations
pub mod debounce;
pub mod driver;
pub mod engine;
pub mod error;
pub mod events;
pub mod mapping;
pub mod mocks;
pub mod reset;
pub mod schedule;
pub mod window;

pub use driver::{ActuatorDriver, RELEASE_DWELL};
pub use engine::{ALERT_POLL, DispenseEngine, EngineBuilder, TickStatus};
pub use error::{BuildError, DispenseError};
pub use events::{DoseEvent, EventKind, EventSink, FileEventLog};
pub use mapping::{Actuator, HOME_POSITION, POSITIONS, target_position};
pub use reset::DailyResetController;
pub use schedule::{DAYS_PER_WEEK, SLOTS_PER_DAY, ScheduleSlot, ScheduleStore};
pub use window::DoseWindow;
