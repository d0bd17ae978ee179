use crate::interval;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Title shown before any track matches.
pub const PLACEHOLDER_TITLE: &str = "...";

/// One programme entry. `end_secs` is the start of the next entry; the last
/// entry ends where the first begins, so it may be smaller than `start_secs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    pub start_secs: u32,
    pub end_secs: u32,
    pub title: String,
}

impl TrackInfo {
    /// Start inclusive, end exclusive. Entries that cross midnight
    /// (`end <= start`) cover `[start, day end) ∪ [0, end)`.
    pub fn contains(&self, secs: u32) -> bool {
        if self.start_secs < self.end_secs {
            secs >= self.start_secs && secs < self.end_secs
        } else {
            secs >= self.start_secs || secs < self.end_secs
        }
    }
}

/// Parse `HH:MM:SS=<title>` lines. Blank lines are ignored; any other line
/// that does not parse fails the whole file.
pub fn parse_tracks(text: &str) -> Result<Vec<TrackInfo>, String> {
    let mut starts: Vec<(u32, String)> = Vec::new();
    for (n, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let (time, title) = line
            .split_once('=')
            .ok_or_else(|| format!("Line {}: missing '=' in '{}'", n + 1, line))?;
        let start = interval::parse_clock(time.trim())
            .map_err(|e| format!("Line {}: {}", n + 1, e))?;
        starts.push((start, title.to_string()));
    }

    let ends: Vec<u32> = starts
        .iter()
        .skip(1)
        .chain(starts.first())
        .map(|(start, _)| *start)
        .collect();

    Ok(starts
        .into_iter()
        .zip(ends)
        .map(|((start_secs, title), end_secs)| TrackInfo {
            start_secs,
            end_secs,
            title,
        })
        .collect())
}

/// Read and parse a track listing file.
pub fn load_tracks(path: &Path) -> Result<Vec<TrackInfo>, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read '{}': {}", path.display(), e))?;
    parse_tracks(&text).map_err(|e| format!("'{}': {}", path.display(), e))
}

/// First entry playing at `secs`.
pub fn track_at(tracks: &[TrackInfo], secs: u32) -> Option<&TrackInfo> {
    tracks.iter().find(|t| t.contains(secs))
}

/// Title currently on display. Keeps the last title when nothing matches.
#[derive(Debug, Clone)]
pub struct TitleTicker {
    title: String,
}

impl TitleTicker {
    pub fn new() -> Self {
        TitleTicker {
            title: PLACEHOLDER_TITLE.to_string(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns true when the displayed title changed.
    pub fn update(&mut self, tracks: &[TrackInfo], secs: u32) -> bool {
        match track_at(tracks, secs) {
            Some(t) if t.title != self.title => {
                self.title = t.title.clone();
                true
            }
            _ => false,
        }
    }
}

impl Default for TitleTicker {
    fn default() -> Self {
        Self::new()
    }
}
