use crate::interval::SlotPosition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Streaming flavour the slots are published in. A deployment uses one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamProtocol {
    /// Segmented HLS, `chunks/<slot>/manifest.m3u8`.
    Hls,
    /// DASH, `dash/<slot>/manifest.mpd`.
    Dash,
}

impl Default for StreamProtocol {
    fn default() -> Self {
        StreamProtocol::Dash
    }
}

impl fmt::Display for StreamProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamProtocol::Hls => write!(f, "hls"),
            StreamProtocol::Dash => write!(f, "dash"),
        }
    }
}

impl StreamProtocol {
    /// Parse a protocol name (case-insensitive).
    pub fn from_str_loose(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "hls" | "m3u8" => Ok(StreamProtocol::Hls),
            "dash" | "mpd" => Ok(StreamProtocol::Dash),
            _ => Err(format!("Unknown protocol '{}'. Expected: hls, dash", s)),
        }
    }

    /// Directory under `audio/` holding this protocol's slots.
    pub fn directory(&self) -> &'static str {
        match self {
            StreamProtocol::Hls => "chunks",
            StreamProtocol::Dash => "dash",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            StreamProtocol::Hls => "m3u8",
            StreamProtocol::Dash => "mpd",
        }
    }
}

/// What the player needs to start a slot: where its manifest lives and how
/// far into it to seek.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestDescriptor {
    pub resource_path: String,
    pub seek_offset_secs: f64,
}

/// Builds manifest paths of the form
/// `/<base>/audio/<protocol>/<HH>h<MM>/manifest.<ext>`.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    base: String,
    protocol: StreamProtocol,
}

impl ManifestResolver {
    pub fn new(base: &str, protocol: StreamProtocol) -> Self {
        ManifestResolver {
            base: base.trim_matches('/').to_string(),
            protocol,
        }
    }

    pub fn protocol(&self) -> StreamProtocol {
        self.protocol
    }

    pub fn resolve(&self, position: SlotPosition) -> ManifestDescriptor {
        let mut resource_path = String::new();
        if !self.base.is_empty() {
            resource_path.push('/');
            resource_path.push_str(&self.base);
        }
        resource_path.push_str(&format!(
            "/audio/{}/{}/manifest.{}",
            self.protocol.directory(),
            position.folder_name(),
            self.protocol.extension()
        ));
        ManifestDescriptor {
            resource_path,
            seek_offset_secs: position.in_slot_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval;

    #[test]
    fn dash_path_without_base() {
        let resolver = ManifestResolver::new("", StreamProtocol::Dash);
        let m = resolver.resolve(interval::map(0.0));
        assert_eq!(m.resource_path, "/audio/dash/00h00/manifest.mpd");
        assert_eq!(m.seek_offset_secs, 0.0);
    }

    #[test]
    fn hls_path_with_base_and_offset() {
        let resolver = ManifestResolver::new("/radio/", StreamProtocol::Hls);
        let m = resolver.resolve(interval::map(3661.0));
        assert_eq!(m.resource_path, "/radio/audio/chunks/01h00/manifest.m3u8");
        assert_eq!(m.seek_offset_secs, 61.0);
    }

    #[test]
    fn last_slot_of_the_day() {
        let resolver = ManifestResolver::new("r", StreamProtocol::Dash);
        let m = resolver.resolve(interval::map(86_399.0));
        assert_eq!(m.resource_path, "/r/audio/dash/23h45/manifest.mpd");
        assert_eq!(m.seek_offset_secs, 899.0);
    }

    #[test]
    fn protocol_from_str() {
        assert_eq!(StreamProtocol::from_str_loose("HLS").unwrap(), StreamProtocol::Hls);
        assert_eq!(StreamProtocol::from_str_loose("dash").unwrap(), StreamProtocol::Dash);
        assert!(StreamProtocol::from_str_loose("rtmp").is_err());
    }

    #[test]
    fn protocol_serializes_lowercase() {
        let json = serde_json::to_string(&StreamProtocol::Hls).unwrap();
        assert_eq!(json, "\"hls\"");
    }
}
