//! Headless integration tests for day_radio.
//!
//! These drive DayRadio end-to-end with the simulated player: no audio
//! device, no UI. Every feature is reachable through `cargo test` alone.

use day_radio::config::Config;
use day_radio::interval::{DAY_SECONDS, SLOT_SECONDS};
use day_radio::playback::{PlaybackAdapter, SimulatedPlayer};
use day_radio::radio::DayRadio;
use day_radio::runtime::{self, RadioEvent, Ticker};
use day_radio::storage::KeyValueStore;
use day_radio::tracks;
use day_radio::volume::Volume;
use std::time::Duration;

fn make_radio(now: u32) -> DayRadio<SimulatedPlayer> {
    let mut config = Config::new();
    config.bar_width_px = 864.0;
    let mut radio = DayRadio::new(&config, SimulatedPlayer::new(), now);
    radio.start().unwrap();
    radio
}

fn run_seconds(radio: &mut DayRadio<SimulatedPlayer>, secs: u32) {
    for _ in 0..secs {
        radio.player_mut().advance(1.0);
        radio.tick();
    }
}

// ── Slot transitions ──────────────────────────────────────────────────────

#[test]
fn plays_through_several_slots() {
    let mut radio = make_radio(0);
    let mut paths = vec![radio.current_manifest().unwrap().resource_path.clone()];

    for _ in 0..(3 * SLOT_SECONDS + 10) {
        radio.player_mut().advance(1.0);
        radio.tick();
        let path = &radio.current_manifest().unwrap().resource_path;
        if paths.last() != Some(path) {
            paths.push(path.clone());
        }
    }

    assert_eq!(
        paths,
        vec![
            "/audio/dash/00h00/manifest.mpd",
            "/audio/dash/00h15/manifest.mpd",
            "/audio/dash/00h30/manifest.mpd",
            "/audio/dash/00h45/manifest.mpd",
        ]
    );
    assert_eq!(radio.advance().retry_count(), 0);
    assert_eq!(radio.player().load_count(), 4);
}

#[test]
fn transitions_land_one_second_into_next_slot() {
    // Advance fires at offset 901 and continues from there.
    let mut radio = make_radio(0);
    run_seconds(&mut radio, 2 * SLOT_SECONDS + 2);
    assert_eq!(radio.timeline().slot_index(), 2);
    assert_eq!(radio.timeline().elapsed_secs(), 2 * SLOT_SECONDS + 2);
}

#[test]
fn end_of_day_wraps_to_midnight() {
    let mut radio = make_radio(DAY_SECONDS - 5);
    run_seconds(&mut radio, 10);
    assert_eq!(radio.timeline().slot_index(), 0);
    assert!(radio.timeline().elapsed_secs() < 10);
    assert_eq!(radio.advance().retry_count(), 0);
    assert_eq!(
        radio.current_manifest().unwrap().resource_path,
        "/audio/dash/00h00/manifest.mpd"
    );
    assert!(
        radio
            .logs
            .get(0)
            .iter()
            .any(|e| e.message.contains("End of day"))
    );
}

#[test]
fn stalled_loads_recover_with_nudged_target() {
    let mut radio = make_radio(SLOT_SECONDS - 1);
    run_seconds(&mut radio, 1);
    radio.player_mut().set_fail_loads(true);
    run_seconds(&mut radio, 1); // offset 901: advance attempt fails
    // The old slot's media is stuck at its end.
    radio.player_mut().set_frozen(true);
    run_seconds(&mut radio, 2);
    assert!(radio.advance().retry_count() >= 2);
    assert_eq!(radio.status().advance_state, "stalled");

    radio.player_mut().set_fail_loads(false);
    radio.tick();
    let m = radio.current_manifest().unwrap();
    assert_eq!(m.resource_path, "/audio/dash/00h15/manifest.mpd");
    assert_eq!(m.seek_offset_secs, 2.0);
}

#[test]
fn manual_seek_clears_stall() {
    let mut radio = make_radio(SLOT_SECONDS - 1);
    run_seconds(&mut radio, 1);
    radio.player_mut().set_fail_loads(true);
    run_seconds(&mut radio, 1); // offset 901: advance attempt fails
    // The old slot's media is stuck at its end.
    radio.player_mut().set_frozen(true);
    run_seconds(&mut radio, 2);
    assert!(radio.advance().retry_count() >= 2);

    radio.player_mut().set_fail_loads(false);
    radio.seek_to_time(10 * 3600).unwrap();
    assert_eq!(radio.advance().retry_count(), 0);
    assert_eq!(radio.advance().last_marked(), 10 * 3600);
    assert_eq!(radio.status().slot_folder, "10h00");
}

// ── Bar interaction ───────────────────────────────────────────────────────

#[test]
fn click_then_resize_keeps_marker_aligned() {
    let mut radio = make_radio(0);
    radio.click(216.0).unwrap(); // quarter of the bar -> 06:00
    assert_eq!(radio.status().clock, "06:00:00");
    assert_eq!(radio.status().progress_px, 216.0);

    radio.resize(1728.0).unwrap();
    let status = radio.status();
    assert_eq!(status.clock, "06:00:00");
    assert_eq!(status.progress_px, 432.0);
    assert_eq!(status.bar_width_px, 1728.0);
}

#[test]
fn same_slot_seek_does_not_reload() {
    let mut radio = make_radio(3600);
    let loads = radio.player().load_count();
    radio.seek_to_time(3600 + 300).unwrap();
    assert_eq!(radio.player().load_count(), loads);
    assert_eq!(radio.player().current_offset_secs(), 300.0);
}

// ── Track titles ──────────────────────────────────────────────────────────

#[test]
fn title_follows_the_clock() {
    let list = tracks::parse_tracks("00:00:00=Opening\n00:00:05=Second\n").unwrap();
    let mut config = Config::new();
    config.bar_width_px = 864.0;
    let mut radio = DayRadio::new(&config, SimulatedPlayer::new(), 0).with_tracks(list);
    radio.start().unwrap();
    assert_eq!(radio.title(), tracks::PLACEHOLDER_TITLE);
    run_seconds(&mut radio, 1);
    assert_eq!(radio.title(), "Opening");
    run_seconds(&mut radio, 5);
    assert_eq!(radio.title(), "Second");
}

// ── Volume persistence ────────────────────────────────────────────────────

#[test]
fn volume_is_restored_and_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    {
        let mut store = KeyValueStore::open(&path);
        Volume::new(0.5).save(&mut store).unwrap();
    }

    let config = Config::new();
    let mut radio = DayRadio::new(&config, SimulatedPlayer::new(), 0)
        .with_store(KeyValueStore::open(&path));
    radio.start().unwrap();
    assert_eq!(radio.player().volume(), 0.5);

    radio.volume_up();
    radio.volume_up();
    assert_eq!(KeyValueStore::open(&path).get("doas_v"), Some("0.70"));

    for _ in 0..20 {
        radio.volume_down();
    }
    assert_eq!(radio.volume().level(), 0.0);
    assert_eq!(KeyValueStore::open(&path).get("doas_v"), Some("0.00"));
}

// ── Autoplay ──────────────────────────────────────────────────────────────

#[test]
fn blocked_autoplay_recovers_on_press_start() {
    let config = Config::new();
    let player = SimulatedPlayer::new().with_autoplay_denied();
    let mut radio = DayRadio::new(&config, player, 0);
    radio.start().unwrap();
    assert!(radio.status().awaiting_start);
    assert!(radio.status().is_paused);

    // Ticks while blocked do not move the clock.
    run_seconds(&mut radio, 5);
    assert_eq!(radio.timeline().elapsed_secs(), 0);

    radio.player_mut().allow_autoplay();
    radio.press_start();
    run_seconds(&mut radio, 5);
    assert_eq!(radio.timeline().elapsed_secs(), 5);
    assert!(!radio.status().awaiting_start);
}

// ── Runtime ───────────────────────────────────────────────────────────────

struct FixedTicks(u32);

impl Ticker for FixedTicks {
    fn until_next(&self) -> Duration {
        if self.0 == 0 {
            Duration::from_millis(200)
        } else {
            Duration::ZERO
        }
    }

    fn fire(&mut self) -> Duration {
        self.0 -= 1;
        Duration::from_secs(1)
    }
}

#[test]
fn runtime_serializes_events_and_ticks() {
    let mut radio = make_radio(0);
    let (handle, rx) = runtime::channel();
    handle.send(RadioEvent::SeekTo(7200));
    handle.send(RadioEvent::VolumeDown);
    drop(handle);

    let mut ticker = FixedTicks(10);
    runtime::run(&mut radio, &rx, &mut ticker, |r, dt| {
        r.player_mut().advance(dt.as_secs_f64())
    });

    // Ticks first (always due), then the queued events, then the channel closes.
    assert_eq!(radio.timeline().elapsed_secs(), 7200);
    assert_eq!(radio.volume().level(), 0.9);
}

#[test]
fn last_tick_logs_remain_after_runtime_stops() {
    // A driver printing logs before each tick still owes the last tick's.
    let mut radio = make_radio(SLOT_SECONDS - 2);
    let (handle, rx) = runtime::channel();
    drop(handle);

    let mut printed = 0;
    let mut ticker = FixedTicks(3);
    runtime::run(&mut radio, &rx, &mut ticker, |r, dt| {
        printed = r.logs.next_index();
        r.player_mut().advance(dt.as_secs_f64())
    });

    let tail = radio.logs.get(printed);
    assert!(tail.iter().any(|e| e.message.contains("00h15")));
}

#[test]
fn status_serializes_for_ui_shells() {
    let radio = make_radio(4500);
    let json = serde_json::to_value(radio.status()).unwrap();
    assert_eq!(json["slot_folder"], "01h15");
    assert_eq!(json["clock"], "01:15:00");
    assert_eq!(json["advance_state"], "playing");
}
