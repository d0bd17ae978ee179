//! The playback seam. The radio core only loads manifests, seeks and polls
//! the offset; decoding and streaming belong to the implementation.

use crate::manifest::ManifestDescriptor;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// The host refused to start audio without a user gesture.
    PermissionDenied,
    /// The manifest or its media could not be loaded.
    Load(String),
    /// The output device is unusable.
    Output(String),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::PermissionDenied => write!(f, "playback not permitted yet"),
            PlaybackError::Load(e) => write!(f, "load failed: {}", e),
            PlaybackError::Output(e) => write!(f, "audio output error: {}", e),
        }
    }
}

pub trait PlaybackAdapter {
    /// Load the slot's manifest (or reuse it if already loaded) and seek.
    fn load_and_seek(&mut self, manifest: &ManifestDescriptor) -> Result<(), PlaybackError>;

    /// Seconds played in the currently loaded slot.
    fn current_offset_secs(&self) -> f64;

    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// Volume in `[0, 1]`.
    fn set_volume(&mut self, volume: f32);
}

/// Headless player driven by an external clock.
///
/// The offset only moves through [`SimulatedPlayer::advance`], which makes
/// tick-by-tick behaviour reproducible. It can be told to refuse autoplay,
/// fail loads, or freeze at its current offset.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer {
    loaded_path: Option<String>,
    offset_secs: f64,
    paused: bool,
    volume: f32,
    deny_autoplay: bool,
    fail_loads: bool,
    frozen: bool,
    load_count: usize,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        SimulatedPlayer {
            loaded_path: None,
            offset_secs: 0.0,
            paused: true,
            volume: 1.0,
            deny_autoplay: false,
            fail_loads: false,
            frozen: false,
            load_count: 0,
        }
    }

    /// Refuse the first `play()` until `allow_autoplay` is called.
    pub fn with_autoplay_denied(mut self) -> Self {
        self.deny_autoplay = true;
        self
    }

    pub fn allow_autoplay(&mut self) {
        self.deny_autoplay = false;
    }

    pub fn set_fail_loads(&mut self, fail: bool) {
        self.fail_loads = fail;
    }

    /// While frozen, `advance` leaves the offset untouched.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Move the playback clock forward by `secs` if playing.
    pub fn advance(&mut self, secs: f64) {
        if !self.paused && !self.frozen && self.loaded_path.is_some() {
            self.offset_secs += secs;
        }
    }

    pub fn loaded_path(&self) -> Option<&str> {
        self.loaded_path.as_deref()
    }

    /// Number of manifests actually fetched (same-path seeks excluded).
    pub fn load_count(&self) -> usize {
        self.load_count
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackAdapter for SimulatedPlayer {
    fn load_and_seek(&mut self, manifest: &ManifestDescriptor) -> Result<(), PlaybackError> {
        if self.fail_loads {
            return Err(PlaybackError::Load(format!(
                "'{}' unavailable",
                manifest.resource_path
            )));
        }
        if self.loaded_path.as_deref() != Some(manifest.resource_path.as_str()) {
            self.loaded_path = Some(manifest.resource_path.clone());
            self.load_count += 1;
        }
        self.offset_secs = manifest.seek_offset_secs;
        Ok(())
    }

    fn current_offset_secs(&self) -> f64 {
        self.offset_secs
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.deny_autoplay {
            return Err(PlaybackError::PermissionDenied);
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}
