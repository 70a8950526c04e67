#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Schedule intake schema and parsing for the dispenser.
//!
//! - `ScheduleFile` is deserialized from TOML (or the companion app's CSV
//!   export) and validated here, at the boundary. The core only ever sees
//!   in-range `SlotAssignment` tuples.
//! - Day, meal and timing are closed enumerations, so day/slot ranges are
//!   enforced by parsing; only hour/minute and duplicates need checks.

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DayName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayName {
    /// Day index with Monday = 0.
    pub fn index(self) -> u8 {
        match self {
            Self::Monday => 0,
            Self::Tuesday => 1,
            Self::Wednesday => 2,
            Self::Thursday => 3,
            Self::Friday => 4,
            Self::Saturday => 5,
            Self::Sunday => 6,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealName {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealName {
    pub fn index(self) -> u8 {
        match self {
            Self::Breakfast => 0,
            Self::Lunch => 1,
            Self::Dinner => 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealTiming {
    Before,
    After,
}

impl MealTiming {
    pub fn index(self) -> u8 {
        match self {
            Self::Before => 0,
            Self::After => 1,
        }
    }
}

/// One dose entry as sent by the companion application.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct DoseEntry {
    pub day: DayName,
    pub meal: MealName,
    pub timing: MealTiming,
    pub hour: u8,
    pub minute: u8,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl DoseEntry {
    /// Logical slot index: three meals, before/after each.
    pub fn slot(&self) -> u8 {
        self.meal.index() * 2 + self.timing.index()
    }
}

/// Whole-schedule document. Applied atomically: every update replaces all
/// 42 (day, slot) time/active triples.
#[derive(Debug, Deserialize, Default)]
pub struct ScheduleFile {
    #[serde(default)]
    pub dose: Vec<DoseEntry>,
}

/// Validated (day, slot, time) tuple the core consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAssignment {
    pub day: u8,
    pub slot: u8,
    pub hour: u8,
    pub minute: u8,
    pub active: bool,
}

impl ScheduleFile {
    /// Validate all entries and produce the assignment tuples.
    ///
    /// Rejects out-of-range hour/minute and duplicate (day, meal, timing)
    /// keys. Entries may arrive in any order.
    pub fn validate(&self) -> eyre::Result<Vec<SlotAssignment>> {
        let mut seen = [[false; 6]; 7];
        let mut out = Vec::with_capacity(self.dose.len());
        for (i, e) in self.dose.iter().enumerate() {
            if e.hour > 23 {
                eyre::bail!("entry {i}: hour {} out of range (0..=23)", e.hour);
            }
            if e.minute > 59 {
                eyre::bail!("entry {i}: minute {} out of range (0..=59)", e.minute);
            }
            let day = e.day.index();
            let slot = e.slot();
            if seen[day as usize][slot as usize] {
                eyre::bail!(
                    "entry {i}: duplicate assignment for {:?} {:?} {:?}",
                    e.day,
                    e.meal,
                    e.timing
                );
            }
            seen[day as usize][slot as usize] = true;
            out.push(SlotAssignment {
                day,
                slot,
                hour: e.hour,
                minute: e.minute,
                active: e.active,
            });
        }
        Ok(out)
    }
}

pub fn load_toml(s: &str) -> Result<ScheduleFile, toml::de::Error> {
    toml::from_str::<ScheduleFile>(s)
}

/// Schedule CSV schema.
///
/// Expected headers:
/// day,meal,timing,hour,minute,active
///
/// Example:
/// day,meal,timing,hour,minute,active
/// monday,breakfast,before,8,0,true
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ScheduleRow {
    pub day: DayName,
    pub meal: MealName,
    pub timing: MealTiming,
    pub hour: u8,
    pub minute: u8,
    pub active: bool,
}

/// Read the companion app's CSV export into a `ScheduleFile`. Headers are
/// enforced; validation still happens via `ScheduleFile::validate`.
pub fn read_csv_schedule<R: std::io::Read>(reader: R) -> eyre::Result<ScheduleFile> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    {
        let headers = rdr.headers()?;
        let expected = ["day", "meal", "timing", "hour", "minute", "active"];
        if headers.len() != expected.len() || headers.iter().zip(expected).any(|(h, e)| h != e) {
            eyre::bail!("schedule CSV must have headers: {}", expected.join(","));
        }
    }
    let mut dose = Vec::new();
    for rec in rdr.deserialize::<ScheduleRow>() {
        let row = rec?;
        dose.push(DoseEntry {
            day: row.day,
            meal: row.meal,
            timing: row.timing,
            hour: row.hour,
            minute: row.minute,
            active: row.active,
        });
    }
    Ok(ScheduleFile { dose })
}
