//! Fixed-size schedule table: one slot per (day-of-week, logical slot).

use dispenser_config::SlotAssignment;

pub const DAYS_PER_WEEK: usize = 7;
pub const SLOTS_PER_DAY: usize = 6;

/// One configured dose opportunity.
///
/// `dispensed` and `missed` are mutually exclusive outcome flags for the
/// current day; both are false until the slot's window has been evaluated,
/// and both reset at day rollover. When `active` is false the outcome flags
/// are never evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub hour: u8,
    pub minute: u8,
    pub active: bool,
    pub dispensed: bool,
    pub missed: bool,
}

impl ScheduleSlot {
    pub const INACTIVE: Self = Self {
        hour: 0,
        minute: 0,
        active: false,
        dispensed: false,
        missed: false,
    };

    /// Still awaiting evaluation today.
    pub fn pending(&self) -> bool {
        self.active && !self.dispensed && !self.missed
    }
}

/// Arena-style table owning all 42 slots. Single writer per field group: the
/// configuration intake writes hour/minute/active, the dispense engine writes
/// the outcome flags, the daily reset clears them.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    slots: [[ScheduleSlot; SLOTS_PER_DAY]; DAYS_PER_WEEK],
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self {
            slots: [[ScheduleSlot::INACTIVE; SLOTS_PER_DAY]; DAYS_PER_WEEK],
        }
    }

    /// Copy of the slot at (day, slot). Out-of-range indices are a
    /// programming error: fatal in debug builds, an inactive slot in release.
    pub fn get(&self, day: usize, slot: usize) -> ScheduleSlot {
        debug_assert!(day < DAYS_PER_WEEK && slot < SLOTS_PER_DAY, "slot index out of range");
        self.slots
            .get(day)
            .and_then(|d| d.get(slot))
            .copied()
            .unwrap_or(ScheduleSlot::INACTIVE)
    }

    /// Bulk replacement from the configuration intake. Every slot's
    /// hour/minute/active is overwritten (slots absent from `assignments`
    /// become inactive); same-day dispensed/missed flags are preserved so a
    /// reconfiguration cannot re-arm a dose already taken or missed today.
    pub fn set_all(&mut self, assignments: &[SlotAssignment]) {
        for day in self.slots.iter_mut() {
            for slot in day.iter_mut() {
                slot.hour = 0;
                slot.minute = 0;
                slot.active = false;
            }
        }
        for a in assignments {
            let (day, slot) = (a.day as usize, a.slot as usize);
            debug_assert!(
                day < DAYS_PER_WEEK && slot < SLOTS_PER_DAY,
                "assignment index out of range"
            );
            if let Some(s) = self.slots.get_mut(day).and_then(|d| d.get_mut(slot)) {
                s.hour = a.hour;
                s.minute = a.minute;
                s.active = a.active;
            }
        }
        tracing::info!(entries = assignments.len(), "schedule replaced");
    }

    /// Record the terminal outcome for a slot. Exactly one of the two flags
    /// becomes true; marking an already-resolved slot is a programming error
    /// (fatal in debug, first outcome wins in release).
    pub fn mark_outcome(&mut self, day: usize, slot: usize, dispensed: bool) {
        debug_assert!(day < DAYS_PER_WEEK && slot < SLOTS_PER_DAY, "slot index out of range");
        let Some(s) = self.slots.get_mut(day).and_then(|d| d.get_mut(slot)) else {
            return;
        };
        debug_assert!(!s.dispensed && !s.missed, "slot outcome already recorded");
        if s.dispensed || s.missed {
            return;
        }
        if dispensed {
            s.dispensed = true;
        } else {
            s.missed = true;
        }
    }

    /// Clear all outcome flags; hour/minute/active are untouched.
    pub fn reset_day_flags(&mut self) {
        for day in self.slots.iter_mut() {
            for slot in day.iter_mut() {
                slot.dispensed = false;
                slot.missed = false;
            }
        }
    }
}

impl Default for ScheduleStore {
    fn default() -> Self {
        Self::new()
    }
}
