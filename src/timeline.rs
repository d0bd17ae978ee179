use crate::interval::{self, SlotPosition, DAY_SECONDS, SLOT_SECONDS};

/// A request to move playback to an absolute position of the day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekRequest {
    pub target_secs: f64,
}

/// Position of the day bar and the pixel scale used to draw it.
///
/// All fields are private so the slot/offset invariant cannot be broken from
/// outside: `elapsed = slot_index * SLOT_SECONDS + offset`, offset in
/// `[0, SLOT_SECONDS)`.
#[derive(Debug, Clone)]
pub struct Timeline {
    start_secs: u32,
    elapsed_secs: u32,
    slot_index: u32,
    pixel_width: f64,
    pixels_per_second: f64,
    progress_px: f64,
}

impl Timeline {
    /// Start the bar at `now_secs` (seconds since midnight).
    pub fn new(now_secs: u32, pixel_width: f64) -> Self {
        let now = now_secs % DAY_SECONDS;
        let mut timeline = Timeline {
            start_secs: now,
            elapsed_secs: now,
            slot_index: now / SLOT_SECONDS,
            pixel_width: 0.0,
            pixels_per_second: 0.0,
            progress_px: 0.0,
        };
        timeline.set_width(pixel_width);
        timeline
    }

    pub fn start_secs(&self) -> u32 {
        self.start_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn slot_index(&self) -> u32 {
        self.slot_index
    }

    pub fn pixel_width(&self) -> f64 {
        self.pixel_width
    }

    pub fn pixels_per_second(&self) -> f64 {
        self.pixels_per_second
    }

    /// Width of the progress bar in pixels.
    pub fn progress_px(&self) -> f64 {
        self.progress_px
    }

    /// Current position split into slot and offset.
    pub fn position(&self) -> SlotPosition {
        interval::map(self.elapsed_secs as f64)
    }

    /// Digital clock text for the current position.
    pub fn clock_display(&self) -> String {
        interval::format_clock(self.elapsed_secs)
    }

    /// The bar was resized. Returns a seek at the unchanged position so the
    /// marker and the audio stay aligned with the new scale.
    pub fn on_resize(&mut self, new_pixel_width: f64) -> SeekRequest {
        self.set_width(new_pixel_width);
        SeekRequest {
            target_secs: self.elapsed_secs as f64,
        }
    }

    /// Convert a click at `pixel_offset` into a seek request.
    pub fn seek_to_pixel_offset(&self, pixel_offset: f64) -> SeekRequest {
        let secs = if self.pixels_per_second > 0.0 && pixel_offset.is_finite() {
            pixel_offset / self.pixels_per_second
        } else {
            0.0
        };
        SeekRequest {
            target_secs: clamp_to_day(secs),
        }
    }

    /// Record the position chosen by a seek.
    pub fn apply_seek(&mut self, position: SlotPosition) {
        let elapsed = clamp_to_day(position.elapsed_secs()) as u32;
        self.slot_index = elapsed / SLOT_SECONDS;
        self.elapsed_secs = elapsed;
        self.refresh_progress();
    }

    /// Once per second with the playback offset inside the current slot.
    ///
    /// Saturates at the last second of the day; rolling over to midnight is
    /// decided by the auto-advance monitor.
    pub fn tick(&mut self, playback_offset_secs: f64) {
        let offset = if playback_offset_secs.is_finite() {
            playback_offset_secs.max(0.0).trunc()
        } else {
            0.0
        };
        let raw = (self.slot_index * SLOT_SECONDS) as f64 + offset;
        self.elapsed_secs = raw.min((DAY_SECONDS - 1) as f64) as u32;
        self.refresh_progress();
    }

    fn set_width(&mut self, pixel_width: f64) {
        self.pixel_width = if pixel_width.is_finite() {
            pixel_width.max(0.0)
        } else {
            0.0
        };
        self.pixels_per_second = self.pixel_width / DAY_SECONDS as f64;
        self.refresh_progress();
    }

    fn refresh_progress(&mut self) {
        self.progress_px = self.elapsed_secs as f64 * self.pixels_per_second;
    }
}

/// Clamp to `[0, DAY_SECONDS)`.
fn clamp_to_day(secs: f64) -> f64 {
    if !secs.is_finite() {
        return 0.0;
    }
    secs.clamp(0.0, (DAY_SECONDS - 1) as f64)
}
