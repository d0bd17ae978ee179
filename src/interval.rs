//! Slot arithmetic: one day is cut into 96 slots of fifteen minutes each.

use serde::Serialize;

/// Seconds in one day of programming.
pub const DAY_SECONDS: u32 = 86_400;

/// Seconds covered by one slot (one manifest).
pub const SLOT_SECONDS: u32 = 900;

/// Minutes covered by one slot.
pub const SLOT_MINUTES: u32 = SLOT_SECONDS / 60;

/// Number of slots in a day.
pub const SLOTS_PER_DAY: u32 = DAY_SECONDS / SLOT_SECONDS;

/// A position split into its slot and the offset inside that slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlotPosition {
    /// `floor(elapsed / SLOT_SECONDS)`. Not wrapped to the day.
    pub slot_index: u64,
    /// Seconds into the slot, always in `[0, SLOT_SECONDS)`.
    pub in_slot_offset: f64,
}

impl SlotPosition {
    /// Seconds since midnight at which this slot starts.
    pub fn slot_start_secs(&self) -> u64 {
        self.slot_index.saturating_mul(SLOT_SECONDS as u64)
    }

    /// Absolute position in seconds, i.e. `slot_start + offset`.
    pub fn elapsed_secs(&self) -> f64 {
        self.slot_start_secs() as f64 + self.in_slot_offset
    }

    /// Wall-clock hour and minute at which the slot starts.
    /// Hours keep counting past 23 for positions beyond one day.
    pub fn clock(&self) -> (u64, u64) {
        let minutes = self.slot_index.saturating_mul(SLOT_MINUTES as u64);
        (minutes / 60, minutes % 60)
    }

    /// Folder name of the slot, e.g. `"01h15"`.
    pub fn folder_name(&self) -> String {
        let (hour, minute) = self.clock();
        format!("{:02}h{:02}", hour, minute)
    }
}

/// Split `elapsed_secs` into slot index and in-slot offset.
///
/// Negative or non-finite input is treated as zero. Values past one day map
/// to slot indices beyond the last slot; wrapping is the caller's job.
/// Exact for every input below 2^53 seconds, where `f64` still holds whole
/// seconds.
pub fn map(elapsed_secs: f64) -> SlotPosition {
    let secs = if elapsed_secs.is_finite() {
        elapsed_secs.max(0.0)
    } else {
        0.0
    };
    let slot = SLOT_SECONDS as f64;
    SlotPosition {
        slot_index: (secs / slot).floor() as u64,
        in_slot_offset: secs % slot,
    }
}

/// Convert a wall-clock time into seconds since midnight.
pub fn seconds_of_day(time: chrono::NaiveTime) -> u32 {
    use chrono::Timelike;
    time.num_seconds_from_midnight()
}

/// Format seconds since midnight as `HH:MM:SS`.
pub fn format_clock(secs: u32) -> String {
    let secs = secs % DAY_SECONDS;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Parse `HH:MM:SS` or `HH:MM` into seconds since midnight.
pub fn parse_clock(s: &str) -> Result<u32, String> {
    chrono::NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| chrono::NaiveTime::parse_from_str(s, "%H:%M"))
        .map(seconds_of_day)
        .map_err(|_| format!("Invalid time '{}'. Expected HH:MM or HH:MM:SS", s))
}
