//! Auto-advance monitor.
//!
//! Evaluated once per tick against the playback offset inside the current
//! slot. When the slot's audio runs past the slot length, it picks the next
//! target position. Repeated evaluations that land on the same position count
//! as a stall, and from the second retry on the target is nudged forward by
//! one second so the next request differs from the one that got stuck.

use crate::interval::{DAY_SECONDS, SLOT_SECONDS};
use serde::Serialize;
use std::fmt;

/// Retries at the same position before the target gets nudged.
pub const STALL_RETRY_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceState {
    /// Offset is within the current slot.
    Playing,
    /// Slot finished, a new target is being emitted.
    Advancing,
    /// The last advance did not move the position.
    Stalled,
}

impl fmt::Display for AdvanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvanceState::Playing => write!(f, "playing"),
            AdvanceState::Advancing => write!(f, "advancing"),
            AdvanceState::Stalled => write!(f, "stalled"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutoAdvance {
    last_marked: u32,
    retry_count: u32,
    state: AdvanceState,
}

impl AutoAdvance {
    pub fn new() -> Self {
        AutoAdvance {
            last_marked: 0,
            retry_count: 0,
            state: AdvanceState::Playing,
        }
    }

    pub fn last_marked(&self) -> u32 {
        self.last_marked
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn state(&self) -> AdvanceState {
        self.state
    }

    /// Manual seek: trust the new position and forget any stall history.
    pub fn mark(&mut self, position_secs: u32) {
        self.last_marked = position_secs;
        self.retry_count = 0;
        self.state = AdvanceState::Playing;
    }

    /// A manifest failed to load. Counts toward the same stall threshold as a
    /// position that does not move.
    pub fn record_load_failure(&mut self) {
        self.retry_count += 1;
        self.state = AdvanceState::Stalled;
    }

    /// Returns the seek target when the current slot has finished.
    pub fn evaluate(&mut self, playback_offset_secs: f64, elapsed_secs: u32) -> Option<u32> {
        if playback_offset_secs.is_nan() || playback_offset_secs <= SLOT_SECONDS as f64 {
            if self.state == AdvanceState::Advancing {
                self.state = AdvanceState::Playing;
            }
            return None;
        }
        self.state = AdvanceState::Advancing;

        // New day: start over from midnight with a clean tracker.
        if elapsed_secs >= DAY_SECONDS - 1 {
            self.mark(0);
            return Some(0);
        }

        let mut target = elapsed_secs;
        if self.last_marked == elapsed_secs {
            self.retry_count += 1;
            self.state = AdvanceState::Stalled;
        } else {
            // Any other position (including one behind the mark after a
            // backwards seek) is treated as fresh progress.
            self.last_marked = elapsed_secs;
            self.retry_count = 0;
            self.state = AdvanceState::Playing;
        }

        // Not clamped to the slot boundary: a nudge at the last second of a
        // slot lands in the next one. Cannot pass the end of day because the
        // wrap branch above catches DAY_SECONDS - 1.
        if self.retry_count >= STALL_RETRY_THRESHOLD {
            target += 1;
        }
        Some(target)
    }
}

impl Default for AutoAdvance {
    fn default() -> Self {
        Self::new()
    }
}
