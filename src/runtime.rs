//! Event loop driving a [`DayRadio`].
//!
//! One thread owns the radio. Input arrives as [`RadioEvent`]s over an
//! `mpsc` channel; the loop waits on it with `recv_timeout` until the next
//! tick is due, so every event and every tick runs to completion before the
//! next one starts. Other threads only hold a [`RadioHandle`].

use crate::playback::PlaybackAdapter;
use crate::radio::DayRadio;
use std::sync::mpsc;
use std::time::{Duration, Instant};

// ── Events & Handle ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RadioEvent {
    /// Click on the day bar, in pixels from its left edge.
    Click(f64),
    /// Jump to a time of day, in seconds.
    SeekTo(u32),
    /// New bar width in pixels.
    Resize(f64),
    Play,
    Pause,
    TogglePlayback,
    VolumeUp,
    VolumeDown,
    PressStart,
    Shutdown,
}

/// Cloneable sender for [`RadioEvent`]s.
#[derive(Clone)]
pub struct RadioHandle {
    tx: mpsc::Sender<RadioEvent>,
}

impl RadioHandle {
    /// Returns false once the runtime has gone away.
    pub fn send(&self, event: RadioEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(RadioEvent::Shutdown);
    }
}

pub fn channel() -> (RadioHandle, mpsc::Receiver<RadioEvent>) {
    let (tx, rx) = mpsc::channel();
    (RadioHandle { tx }, rx)
}

/// Apply one event. Returns false on shutdown.
pub fn dispatch<P: PlaybackAdapter>(radio: &mut DayRadio<P>, event: RadioEvent) -> bool {
    let result = match event {
        RadioEvent::Click(px) => radio.click(px),
        RadioEvent::SeekTo(secs) => radio.seek_to_time(secs),
        RadioEvent::Resize(width) => radio.resize(width),
        RadioEvent::Play => {
            radio.play();
            Ok(())
        }
        RadioEvent::Pause => {
            radio.pause();
            Ok(())
        }
        RadioEvent::TogglePlayback => {
            radio.toggle_playback();
            Ok(())
        }
        RadioEvent::VolumeUp => {
            radio.volume_up();
            Ok(())
        }
        RadioEvent::VolumeDown => {
            radio.volume_down();
            Ok(())
        }
        RadioEvent::PressStart => {
            radio.press_start();
            Ok(())
        }
        RadioEvent::Shutdown => return false,
    };
    // Rejected and failed seeks are already in the radio's log; keep running.
    let _ = result;
    true
}

// ── Ticker ───────────────────────────────────────────────────────────────────

/// Source of the periodic tick.
pub trait Ticker {
    /// Time left until the next tick is due (zero when overdue).
    fn until_next(&self) -> Duration;

    /// Consume the due tick. Returns the time covered by it.
    fn fire(&mut self) -> Duration;
}

/// Wall-clock ticker with a fixed period.
pub struct IntervalTicker {
    period: Duration,
    next_due: Instant,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        IntervalTicker {
            period,
            next_due: Instant::now() + period,
        }
    }
}

impl Ticker for IntervalTicker {
    fn until_next(&self) -> Duration {
        self.next_due.saturating_duration_since(Instant::now())
    }

    fn fire(&mut self) -> Duration {
        self.next_due += self.period;
        // Fell far behind (suspended process): resync instead of bursting.
        let now = Instant::now();
        if self.next_due < now {
            self.next_due = now + self.period;
        }
        self.period
    }
}

// ── Runtime ──────────────────────────────────────────────────────────────────

/// Drive `radio` until a shutdown event arrives or every handle is dropped.
///
/// `before_tick` runs right before each [`DayRadio::tick`] with the time the
/// tick covers; drivers use it to move a simulated player's clock or to
/// render.
pub fn run<P, T, F>(
    radio: &mut DayRadio<P>,
    rx: &mpsc::Receiver<RadioEvent>,
    ticker: &mut T,
    mut before_tick: F,
) where
    P: PlaybackAdapter,
    T: Ticker,
    F: FnMut(&mut DayRadio<P>, Duration),
{
    loop {
        let wait = ticker.until_next();
        if wait.is_zero() {
            let covered = ticker.fire();
            before_tick(radio, covered);
            radio.tick();
            continue;
        }
        match rx.recv_timeout(wait) {
            Ok(event) => {
                if !dispatch(radio, event) {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
