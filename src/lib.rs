//! day_radio: core library of the 24-hour radio.
//!
//! The day is cut into fifteen-minute slots, each published as its own
//! HLS or DASH manifest. This crate maps bar positions and playback time to
//! slots, advances from one slot to the next, and keeps the clock, volume and
//! track title the UI shell renders. The CLI and other shells consume it.

pub mod advance;
pub mod config;
pub mod interval;
pub mod logs;
pub mod manifest;
pub mod playback;
pub mod player;
pub mod radio;
pub mod runtime;
pub mod storage;
pub mod timeline;
pub mod tracks;
pub mod volume;
