use crate::manifest::StreamProtocol;
use crate::volume::DEFAULT_STEP;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path prefix in front of `audio/...`, e.g. `"radio"`. Empty = none.
    #[serde(default)]
    pub base_path: String,
    #[serde(default)]
    pub protocol: StreamProtocol,
    /// Local directory that mirrors the published tree.
    #[serde(default = "default_media_root")]
    pub media_root: String,
    /// Audio file decoded locally inside each slot folder.
    #[serde(default = "default_rendition_file")]
    pub rendition_file: String,
    /// `HH:MM:SS=<title>` listing shown as the current title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks_file: Option<String>,
    /// Width of the day bar in pixels.
    #[serde(default = "default_bar_width")]
    pub bar_width_px: f64,
    /// Tick period in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_volume_step")]
    pub volume_step: f32,
}

fn default_media_root() -> String {
    ".".to_string()
}

fn default_rendition_file() -> String {
    "slot.mp3".to_string()
}

fn default_bar_width() -> f64 {
    960.0
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_volume_step() -> f32 {
    DEFAULT_STEP
}

impl Config {
    pub fn new() -> Self {
        Config {
            base_path: String::new(),
            protocol: StreamProtocol::default(),
            media_root: default_media_root(),
            rendition_file: default_rendition_file(),
            tracks_file: None,
            bar_width_px: default_bar_width(),
            tick_ms: default_tick_ms(),
            volume_step: default_volume_step(),
        }
    }

    /// Default location inside the user's config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("day_radio")
            .join(CONFIG_FILE)
    }

    /// Load config from JSON, or fall back to defaults if missing or corrupt.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str(&data) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("Warning: corrupt config file, using defaults: {}", e),
                },
                Err(e) => eprintln!("Warning: could not read config file: {}", e),
            }
        }
        Config::new()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .map_err(|e| format!("Cannot create '{}': {}", dir.display(), e))?;
            }
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| format!("Serialize error: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Write error: {}", e))?;
        Ok(())
    }

    /// Set the bar width, rejecting non-positive values.
    pub fn set_bar_width(&mut self, width: f64) -> Result<(), String> {
        if !width.is_finite() || width <= 0.0 {
            return Err(format!("Bar width must be positive, got {}", width));
        }
        self.bar_width_px = width;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
