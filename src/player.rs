use crate::interval::SLOT_SECONDS;
use crate::manifest::ManifestDescriptor;
use crate::playback::{PlaybackAdapter, PlaybackError};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// `try_seek` flushes the sink's buffer, so `empty()` reads true for a
/// moment afterwards.
const SEEK_COOLDOWN: Duration = Duration::from_millis(500);

/// Offset reported once the slot's audio has run out: one second past the
/// slot, the same point a full-length rendition would reach.
const DRAINED_OFFSET_SECS: f64 = SLOT_SECONDS as f64 + 1.0;

/// Local playback through rodio.
///
/// rodio does not speak HLS or DASH, so each slot folder carries a
/// pre-rendered rendition next to its manifest
/// (`<media_root>/<base>/audio/<protocol>/<HHhMM>/<rendition_file>`) and that
/// file is what gets decoded. Not serializable; created fresh per session.
pub struct SinkPlayer {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Sink,
    media_root: PathBuf,
    rendition_file: String,
    loaded_path: Option<String>,
    last_seek: Option<Instant>,
    volume: f32,
}

impl SinkPlayer {
    /// Open the default output device.
    pub fn new(media_root: &Path, rendition_file: &str) -> Result<Self, String> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| format!("Failed to open audio output: {}", e))?;
        let sink = Sink::try_new(&handle)
            .map_err(|e| format!("Failed to create audio sink: {}", e))?;
        sink.pause();
        Ok(SinkPlayer {
            _stream: stream,
            stream_handle: handle,
            sink,
            media_root: media_root.to_path_buf(),
            rendition_file: rendition_file.to_string(),
            loaded_path: None,
            last_seek: None,
            volume: 1.0,
        })
    }

    /// Manifest currently loaded, if any.
    pub fn loaded_path(&self) -> Option<&str> {
        self.loaded_path.as_deref()
    }

    fn seek(&mut self, offset_secs: f64) -> Result<(), PlaybackError> {
        seek_sink(&self.sink, offset_secs)?;
        self.last_seek = Some(Instant::now());
        Ok(())
    }

    /// The loaded rendition has played out (not just flushed by a seek).
    fn drained(&self) -> bool {
        self.loaded_path.is_some()
            && self.sink.empty()
            && !in_seek_cooldown(self.last_seek, Instant::now())
    }
}

fn seek_sink(sink: &Sink, offset_secs: f64) -> Result<(), PlaybackError> {
    sink.try_seek(Duration::from_secs_f64(offset_secs.max(0.0)))
        .map_err(|e| PlaybackError::Load(format!("Seek failed: {}", e)))
}

fn in_seek_cooldown(last_seek: Option<Instant>, now: Instant) -> bool {
    last_seek
        .map(|t| now.saturating_duration_since(t) < SEEK_COOLDOWN)
        .unwrap_or(false)
}

/// Offset handed to the monitor: the sink position, or a point past the
/// slot once the audio has run out, so short renditions still advance.
fn reported_offset(sink_pos_secs: f64, drained: bool) -> f64 {
    if drained {
        sink_pos_secs.max(DRAINED_OFFSET_SECS)
    } else {
        sink_pos_secs
    }
}

/// Local file holding the audio of the slot whose manifest is `resource_path`.
pub fn rendition_path(media_root: &Path, resource_path: &str, rendition_file: &str) -> PathBuf {
    let manifest = media_root.join(resource_path.trim_start_matches('/'));
    match manifest.parent() {
        Some(dir) => dir.join(rendition_file),
        None => media_root.join(rendition_file),
    }
}

impl PlaybackAdapter for SinkPlayer {
    fn load_and_seek(&mut self, manifest: &ManifestDescriptor) -> Result<(), PlaybackError> {
        if self.loaded_path.as_deref() == Some(manifest.resource_path.as_str()) && !self.drained() {
            return self.seek(manifest.seek_offset_secs);
        }

        let path = rendition_path(&self.media_root, &manifest.resource_path, &self.rendition_file);
        let file = File::open(&path)
            .map_err(|e| PlaybackError::Load(format!("Cannot open '{}': {}", path.display(), e)))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| PlaybackError::Load(format!("Cannot decode '{}': {}", path.display(), e)))?;

        // Fresh sink per slot so the old slot's buffered audio is dropped.
        // It is held paused until the seek lands; on failure the old slot
        // keeps playing untouched.
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| PlaybackError::Output(format!("Failed to create sink: {}", e)))?;
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(source);
        if let Err(e) = seek_sink(&sink, manifest.seek_offset_secs) {
            sink.stop();
            return Err(e);
        }

        let was_paused = self.sink.is_paused();
        self.sink.stop();
        if !was_paused {
            sink.play();
        }
        self.sink = sink;
        self.loaded_path = Some(manifest.resource_path.clone());
        self.last_seek = Some(Instant::now());
        Ok(())
    }

    fn current_offset_secs(&self) -> f64 {
        reported_offset(self.sink.get_pos().as_secs_f64(), self.drained())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
    }
}
