//! DayRadio: the 24-hour radio core.
//!
//! Owns the timeline, the auto-advance monitor, the manifest resolver and the
//! player. Every input (click, resize, tick, buttons) goes through a method
//! here and runs to completion, so the timeline and the stall tracker only
//! ever have one writer. UI shells read [`DayRadio::status`].

use crate::advance::{AdvanceState, AutoAdvance};
use crate::config::Config;
use crate::interval::{self, DAY_SECONDS};
use crate::logs::LogBuffer;
use crate::manifest::{ManifestDescriptor, ManifestResolver};
use crate::playback::{PlaybackAdapter, PlaybackError};
use crate::storage::KeyValueStore;
use crate::timeline::Timeline;
use crate::tracks::{TitleTicker, TrackInfo};
use crate::volume::Volume;
use serde::Serialize;

/// Snapshot for rendering the bar, clock and controls.
#[derive(Debug, Clone, Serialize)]
pub struct StatusData {
    pub clock: String,
    pub elapsed_secs: u32,
    pub start_secs: u32,
    pub slot_index: u64,
    pub slot_folder: String,
    pub progress_px: f64,
    pub bar_width_px: f64,
    pub manifest_path: Option<String>,
    pub advance_state: String,
    pub retry_count: u32,
    pub last_marked_secs: u32,
    pub volume: f32,
    pub volume_meter: usize,
    pub is_paused: bool,
    pub awaiting_start: bool,
    pub title: String,
}

pub struct DayRadio<P: PlaybackAdapter> {
    timeline: Timeline,
    advance: AutoAdvance,
    resolver: ManifestResolver,
    player: P,
    volume: Volume,
    volume_step: f32,
    store: Option<KeyValueStore>,
    tracks: Vec<TrackInfo>,
    title: TitleTicker,
    current: Option<ManifestDescriptor>,
    awaiting_start: bool,
    pub logs: LogBuffer,
}

impl<P: PlaybackAdapter> DayRadio<P> {
    /// Build the radio positioned at `now_secs`. Nothing is loaded until
    /// [`DayRadio::start`].
    pub fn new(config: &Config, player: P, now_secs: u32) -> Self {
        DayRadio {
            timeline: Timeline::new(now_secs, config.bar_width_px),
            advance: AutoAdvance::new(),
            resolver: ManifestResolver::new(&config.base_path, config.protocol),
            player,
            volume: Volume::default(),
            volume_step: config.volume_step,
            store: None,
            tracks: Vec::new(),
            title: TitleTicker::new(),
            current: None,
            awaiting_start: false,
            logs: LogBuffer::new(),
        }
    }

    /// Persist the volume in `store`, restoring the last saved value.
    pub fn with_store(mut self, store: KeyValueStore) -> Self {
        if let Some(saved) = Volume::load(&store) {
            self.volume = saved;
        }
        self.store = Some(store);
        self
    }

    pub fn with_tracks(mut self, tracks: Vec<TrackInfo>) -> Self {
        self.tracks = tracks;
        self
    }

    // ── Read access ─────────────────────────────────────────────────────

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn advance(&self) -> &AutoAdvance {
        &self.advance
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// For drivers that own the player's clock (simulation, tests).
    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn current_manifest(&self) -> Option<&ManifestDescriptor> {
        self.current.as_ref()
    }

    pub fn title(&self) -> &str {
        self.title.title()
    }

    pub fn awaiting_start(&self) -> bool {
        self.awaiting_start
    }

    pub fn status(&self) -> StatusData {
        let position = self.timeline.position();
        StatusData {
            clock: self.timeline.clock_display(),
            elapsed_secs: self.timeline.elapsed_secs(),
            start_secs: self.timeline.start_secs(),
            slot_index: position.slot_index,
            slot_folder: position.folder_name(),
            progress_px: self.timeline.progress_px(),
            bar_width_px: self.timeline.pixel_width(),
            manifest_path: self.current.as_ref().map(|m| m.resource_path.clone()),
            advance_state: self.advance.state().to_string(),
            retry_count: self.advance.retry_count(),
            last_marked_secs: self.advance.last_marked(),
            volume: self.volume.level(),
            volume_meter: self.volume.meter_segments(),
            is_paused: self.player.is_paused(),
            awaiting_start: self.awaiting_start,
            title: self.title.title().to_string(),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Load the slot of the start time and try to begin playback. A refused
    /// autoplay leaves the radio waiting for [`DayRadio::press_start`].
    pub fn start(&mut self) -> Result<(), String> {
        self.player.set_volume(self.volume.level());
        let start = self.timeline.start_secs();
        self.advance.mark(start);
        self.logs.info(format!(
            "Starting at {}",
            interval::format_clock(start)
        ));
        self.seek_to(start as f64)?;
        self.play();
        Ok(())
    }

    // ── Seeking ─────────────────────────────────────────────────────────

    /// Resolve the slot for `target_secs` and hand it to the player. The
    /// timeline only moves once the player accepted the manifest; a failed
    /// load counts toward the stall threshold.
    fn seek_to(&mut self, target_secs: f64) -> Result<(), String> {
        let target = target_secs.clamp(0.0, (DAY_SECONDS - 1) as f64);
        let position = interval::map(target);
        let manifest = self.resolver.resolve(position);
        match self.player.load_and_seek(&manifest) {
            Ok(()) => {
                self.timeline.apply_seek(position);
                self.logs.info(format!(
                    "Loaded {} at +{:.0}s ({})",
                    manifest.resource_path,
                    manifest.seek_offset_secs,
                    interval::format_clock(target as u32)
                ));
                self.current = Some(manifest);
                Ok(())
            }
            Err(e) => {
                self.advance.record_load_failure();
                let msg = format!("Cannot load {}: {}", manifest.resource_path, e);
                self.logs.error(msg.clone());
                Err(msg)
            }
        }
    }

    /// User clicked the bar `pixel_offset` pixels from its left edge.
    pub fn click(&mut self, pixel_offset: f64) -> Result<(), String> {
        let request = self.timeline.seek_to_pixel_offset(pixel_offset);
        self.manual_seek(request.target_secs)
    }

    /// User asked for an absolute time of day.
    pub fn seek_to_time(&mut self, secs: u32) -> Result<(), String> {
        if secs >= DAY_SECONDS {
            let msg = format!("Time {} is outside the day (0..{})", secs, DAY_SECONDS);
            self.logs.warn(msg.clone());
            return Err(msg);
        }
        self.manual_seek(secs as f64)
    }

    fn manual_seek(&mut self, target_secs: f64) -> Result<(), String> {
        self.advance.mark(target_secs as u32);
        self.seek_to(target_secs)
    }

    /// Bar resized: rescale and re-seek at the same position.
    pub fn resize(&mut self, pixel_width: f64) -> Result<(), String> {
        let request = self.timeline.on_resize(pixel_width);
        self.seek_to(request.target_secs)
    }

    // ── Tick ────────────────────────────────────────────────────────────

    /// Once per tick: follow the player, refresh the title, and move to the
    /// next slot when the current one has played out.
    pub fn tick(&mut self) {
        let offset = self.player.current_offset_secs();
        self.timeline.tick(offset);
        let elapsed = self.timeline.elapsed_secs();

        if self.title.update(&self.tracks, elapsed) {
            self.logs.info(format!("Now playing: {}", self.title.title()));
        }

        let Some(target) = self.advance.evaluate(offset, elapsed) else {
            return;
        };
        if self.advance.state() == AdvanceState::Stalled {
            self.logs.warn(format!(
                "No progress at {} (retry {})",
                interval::format_clock(elapsed),
                self.advance.retry_count()
            ));
        }
        if target == 0 {
            self.logs.info("End of day, back to 00:00:00".to_string());
        }
        // Failures are logged and already fed to the stall counter.
        let _ = self.seek_to(target as f64);
    }

    // ── Transport ───────────────────────────────────────────────────────

    pub fn play(&mut self) {
        match self.player.play() {
            Ok(()) => {
                if self.awaiting_start {
                    self.logs.info("Playback started".to_string());
                }
                self.awaiting_start = false;
            }
            Err(PlaybackError::PermissionDenied) => {
                self.awaiting_start = true;
                self.logs
                    .warn("Playback blocked until the user presses start".to_string());
            }
            Err(e) => self.logs.error(format!("Cannot play: {}", e)),
        }
    }

    pub fn pause(&mut self) {
        self.player.pause();
    }

    /// Space bar.
    pub fn toggle_playback(&mut self) {
        if self.player.is_paused() {
            self.play();
        } else {
            self.pause();
        }
    }

    /// The manual "press start" control shown when autoplay was refused.
    pub fn press_start(&mut self) {
        self.play();
    }

    // ── Volume ──────────────────────────────────────────────────────────

    pub fn volume_up(&mut self) {
        let v = self.volume.up(self.volume_step);
        self.set_volume(v);
    }

    pub fn volume_down(&mut self) {
        let v = self.volume.down(self.volume_step);
        self.set_volume(v);
    }

    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
        self.player.set_volume(volume.level());
        if let Some(store) = self.store.as_mut() {
            if let Err(e) = volume.save(store) {
                self.logs.warn(format!("Volume not saved: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::SimulatedPlayer;

    fn radio_at(now: u32) -> DayRadio<SimulatedPlayer> {
        let mut config = Config::new();
        config.bar_width_px = 864.0;
        DayRadio::new(&config, SimulatedPlayer::new(), now)
    }

    /// Advance the simulated clock by one second and tick.
    fn step(radio: &mut DayRadio<SimulatedPlayer>) {
        radio.player_mut().advance(1.0);
        radio.tick();
    }

    #[test]
    fn start_loads_current_slot() {
        let mut radio = radio_at(3661);
        radio.start().unwrap();
        let m = radio.current_manifest().unwrap();
        assert_eq!(m.resource_path, "/audio/dash/01h00/manifest.mpd");
        assert_eq!(m.seek_offset_secs, 61.0);
        assert!(!radio.player().is_paused());
        assert_eq!(radio.advance().last_marked(), 3661);
    }

    #[test]
    fn tick_follows_playback() {
        let mut radio = radio_at(3661);
        radio.start().unwrap();
        for _ in 0..10 {
            step(&mut radio);
        }
        assert_eq!(radio.timeline().elapsed_secs(), 3671);
        assert_eq!(radio.status().clock, "01:01:11");
    }

    #[test]
    fn slot_end_advances_to_next_manifest() {
        let mut radio = radio_at(899);
        radio.start().unwrap();
        step(&mut radio); // 900.0, still in slot
        assert_eq!(radio.current_manifest().unwrap().resource_path, "/audio/dash/00h00/manifest.mpd");
        step(&mut radio); // 901.0 > 900 -> next slot
        let m = radio.current_manifest().unwrap();
        assert_eq!(m.resource_path, "/audio/dash/00h15/manifest.mpd");
        assert_eq!(m.seek_offset_secs, 1.0);
        assert_eq!(radio.timeline().slot_index(), 1);
        assert_eq!(radio.advance().retry_count(), 0);
    }

    #[test]
    fn click_marks_and_seeks() {
        let mut radio = radio_at(0);
        radio.start().unwrap();
        radio.click(432.0).unwrap();
        assert_eq!(radio.timeline().elapsed_secs(), 43_200);
        assert_eq!(radio.advance().last_marked(), 43_200);
        assert_eq!(
            radio.current_manifest().unwrap().resource_path,
            "/audio/dash/12h00/manifest.mpd"
        );
    }

    #[test]
    fn failed_loads_nudge_the_target() {
        let mut radio = radio_at(899);
        radio.start().unwrap();
        step(&mut radio);
        radio.player_mut().set_fail_loads(true);
        step(&mut radio); // 901: advance attempt fails
        assert!(radio.advance().retry_count() >= 1);
        radio.tick(); // same position again, threshold reached
        radio.player_mut().set_fail_loads(false);
        radio.tick();
        let m = radio.current_manifest().unwrap();
        assert_eq!(m.resource_path, "/audio/dash/00h15/manifest.mpd");
        assert_eq!(m.seek_offset_secs, 2.0);
        assert!(radio.logs.get(0).iter().any(|e| e.level == "error"));
    }

    #[test]
    fn resize_keeps_position() {
        let mut radio = radio_at(43_200);
        radio.start().unwrap();
        radio.resize(1728.0).unwrap();
        assert_eq!(radio.timeline().elapsed_secs(), 43_200);
        assert_eq!(radio.timeline().progress_px(), 864.0);
    }

    #[test]
    fn denied_autoplay_waits_for_start() {
        let mut config = Config::new();
        config.bar_width_px = 864.0;
        let player = SimulatedPlayer::new().with_autoplay_denied();
        let mut radio = DayRadio::new(&config, player, 0);
        radio.start().unwrap();
        assert!(radio.awaiting_start());
        radio.player_mut().allow_autoplay();
        radio.press_start();
        assert!(!radio.awaiting_start());
        assert!(!radio.player().is_paused());
    }

    #[test]
    fn toggle_playback() {
        let mut radio = radio_at(0);
        radio.start().unwrap();
        radio.toggle_playback();
        assert!(radio.player().is_paused());
        radio.toggle_playback();
        assert!(!radio.player().is_paused());
    }

    #[test]
    fn volume_buttons_reach_player() {
        let mut radio = radio_at(0);
        radio.start().unwrap();
        radio.volume_down();
        assert_eq!(radio.volume().level(), 0.9);
        assert_eq!(radio.player().volume(), 0.9);
    }

    #[test]
    fn seek_outside_day_is_rejected() {
        let mut radio = radio_at(0);
        assert!(radio.seek_to_time(DAY_SECONDS).is_err());
    }
}
