//! Dispense outcome records handed to the external log collaborator.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Dispensed,
    Missed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispensed => f.write_str("DISPENSED"),
            Self::Missed => f.write_str("MISSED"),
        }
    }
}

/// One terminal transition of the dispense engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoseEvent {
    pub timestamp: NaiveDateTime,
    pub day: u8,
    pub slot: u8,
    pub kind: EventKind,
}

impl DoseEvent {
    /// Wire format: `YYYY-MM-DD HH:MM:SS,day,slot,KIND`.
    pub fn to_record(&self) -> String {
        format!(
            "{},{},{},{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.day,
            self.slot,
            self.kind
        )
    }
}

/// Append-only sink for dose events. Fire-and-forget from the engine's
/// perspective; implementations own their durability story.
pub trait EventSink {
    fn record(&mut self, event: &DoseEvent);
}

impl<T: EventSink + ?Sized> EventSink for Box<T> {
    fn record(&mut self, event: &DoseEvent) {
        (**self).record(event)
    }
}

/// File-backed sink appending one line per event.
pub struct FileEventLog {
    path: PathBuf,
}

impl FileEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EventSink for FileEventLog {
    fn record(&mut self, event: &DoseEvent) {
        use std::fs::OpenOptions;
        use std::io::Write;
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", event.to_record()) {
                    tracing::warn!(error = %e, path = %self.path.display(), "event log write failed");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "event log open failed");
            }
        }
    }
}
