use clap::{Parser, Subcommand};
use day_radio::config::Config;
use day_radio::interval::{self, DAY_SECONDS};
use day_radio::manifest::{ManifestResolver, StreamProtocol};
use day_radio::playback::SimulatedPlayer;
use day_radio::player::SinkPlayer;
use day_radio::radio::DayRadio;
use day_radio::runtime::{self, IntervalTicker, RadioEvent, RadioHandle};
use day_radio::storage::KeyValueStore;
use day_radio::tracks::{self, TrackInfo};
use day_radio::volume::Volume;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "day-radio", about = "24-hour radio: one manifest per fifteen minutes")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the slot playing right now
    Status,
    /// Print the manifest for a time of day
    Resolve {
        /// Time of day (HH:MM or HH:MM:SS)
        time: String,
    },
    /// List the track titles, or show the one playing at a time
    Tracks {
        /// Track listing (overrides config)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Time of day (HH:MM or HH:MM:SS)
        #[arg(long)]
        at: Option<String>,
    },
    /// Run the radio against a simulated player, one tick per simulated second
    Simulate {
        /// Start time (HH:MM or HH:MM:SS). Defaults to now.
        #[arg(long)]
        from: Option<String>,
        /// Number of ticks to run
        #[arg(short, long, default_value = "1800")]
        ticks: u32,
        /// Make manifest loads fail starting at this tick
        #[arg(long)]
        fail_at: Option<u32>,
        /// How many ticks the failures last
        #[arg(long, default_value = "3")]
        fail_for: u32,
    },
    /// Play through the audio output. Reads commands from stdin.
    Play {
        /// Start time (HH:MM or HH:MM:SS). Defaults to now.
        #[arg(long)]
        from: Option<String>,
    },
    /// Configuration
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
    /// Saved volume
    Volume {
        #[command(subcommand)]
        action: VolumeCmd,
    },
}

#[derive(Subcommand)]
enum ConfigCmd {
    /// Show current configuration
    Show,
    /// Set the path prefix in front of audio/ (empty to clear)
    Base { path: String },
    /// Set the streaming protocol: hls or dash
    Protocol { name: String },
    /// Set the local directory mirroring the published tree
    MediaRoot { path: String },
    /// Set the file decoded inside each slot folder
    Rendition { file: String },
    /// Set the track listing file
    Tracks { file: String },
    /// Set the bar width in pixels
    Width { pixels: f64 },
}

#[derive(Subcommand)]
enum VolumeCmd {
    /// Show the saved volume
    Show,
    /// One step louder
    Up,
    /// One step quieter
    Down,
    /// Set an exact level between 0 and 1
    Set { level: f32 },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_from(&config_path);

    match cli.command {
        Commands::Status => {
            let now = now_secs();
            let position = interval::map(now as f64);
            let resolver = ManifestResolver::new(&config.base_path, config.protocol);
            let manifest = resolver.resolve(position);
            println!("day-radio v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "Now: {} | Slot {}/{} ({}) | Protocol: {}",
                interval::format_clock(now),
                position.slot_index + 1,
                interval::SLOTS_PER_DAY,
                position.folder_name(),
                config.protocol
            );
            println!(
                "Manifest: {} (+{:.0}s)",
                manifest.resource_path, manifest.seek_offset_secs
            );
            if let Some(t) = load_configured_tracks(&config)
                .ok()
                .and_then(|list| tracks::track_at(&list, now).cloned())
            {
                println!("Title: {}", t.title);
            }
        }
        Commands::Resolve { time } => {
            let secs = parse_or_exit(&time);
            let resolver = ManifestResolver::new(&config.base_path, config.protocol);
            let manifest = resolver.resolve(interval::map(secs as f64));
            println!("{} +{:.0}s", manifest.resource_path, manifest.seek_offset_secs);
        }
        Commands::Tracks { file, at } => {
            let list = match file {
                Some(path) => tracks::load_tracks(&path),
                None => load_configured_tracks(&config),
            };
            let list = list.unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
            match at {
                Some(time) => {
                    let secs = parse_or_exit(&time);
                    match tracks::track_at(&list, secs) {
                        Some(t) => println!("{}", t.title),
                        None => println!("{}", tracks::PLACEHOLDER_TITLE),
                    }
                }
                None => {
                    if list.is_empty() {
                        println!("(no tracks)");
                    }
                    for t in &list {
                        println!(
                            "{} - {}  {}",
                            interval::format_clock(t.start_secs),
                            interval::format_clock(t.end_secs),
                            t.title
                        );
                    }
                }
            }
        }
        Commands::Simulate {
            from,
            ticks,
            fail_at,
            fail_for,
        } => {
            let start = from.map(|t| parse_or_exit(&t)).unwrap_or_else(now_secs);
            let mut radio = DayRadio::new(&config, SimulatedPlayer::new(), start)
                .with_tracks(load_configured_tracks(&config).unwrap_or_default());
            if let Err(e) = radio.start() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            let mut printed = print_logs(&radio, 0);
            for tick in 0..ticks {
                if let Some(at) = fail_at {
                    let failing = tick >= at && tick < at + fail_for;
                    radio.player_mut().set_fail_loads(failing);
                }
                radio.player_mut().advance(1.0);
                radio.tick();
                printed = print_logs(&radio, printed);
            }
            let status = radio.status();
            println!(
                "Stopped at {} | slot {} | state: {} | retries: {}",
                status.clock, status.slot_folder, status.advance_state, status.retry_count
            );
        }
        Commands::Play { from } => {
            let start = from.map(|t| parse_or_exit(&t)).unwrap_or_else(now_secs);
            let player = match SinkPlayer::new(Path::new(&config.media_root), &config.rendition_file)
            {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            let tracks = load_configured_tracks(&config).unwrap_or_else(|e| {
                eprintln!("Warning: {}", e);
                Vec::new()
            });
            let mut radio = DayRadio::new(&config, player, start)
                .with_store(KeyValueStore::open(&KeyValueStore::default_path()))
                .with_tracks(tracks);
            if let Err(e) = radio.start() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            println!(
                "Playing from {}. Commands: <enter> pause/resume, + / - volume, \
                 s HH:MM:SS seek, c <px> click, w <px> resize, start, q quit",
                interval::format_clock(start)
            );

            let (handle, rx) = runtime::channel();
            spawn_stdin_reader(handle);
            let mut ticker = IntervalTicker::new(Duration::from_millis(config.tick_ms.max(1)));
            let mut printed = print_logs(&radio, 0);
            runtime::run(&mut radio, &rx, &mut ticker, |r, _| {
                printed = print_logs(r, printed);
            });
            // The last tick and the final events ran after the hook.
            print_logs(&radio, printed);
            println!("Stopped at {}.", radio.timeline().clock_display());
        }
        Commands::Config { action } => {
            match action {
                ConfigCmd::Show => {
                    println!("Config file: {}", config_path.display());
                    match serde_json::to_string_pretty(&config) {
                        Ok(json) => println!("{}", json),
                        Err(e) => eprintln!("Error: {}", e),
                    }
                    return;
                }
                ConfigCmd::Base { path } => config.base_path = path,
                ConfigCmd::Protocol { name } => match StreamProtocol::from_str_loose(&name) {
                    Ok(p) => config.protocol = p,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                },
                ConfigCmd::MediaRoot { path } => config.media_root = path,
                ConfigCmd::Rendition { file } => config.rendition_file = file,
                ConfigCmd::Tracks { file } => config.tracks_file = Some(file),
                ConfigCmd::Width { pixels } => {
                    if let Err(e) = config.set_bar_width(pixels) {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                }
            }
            match config.save_to(&config_path) {
                Ok(()) => println!("Saved {}", config_path.display()),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Volume { action } => {
            let mut store = KeyValueStore::open(&KeyValueStore::default_path());
            let current = Volume::load(&store).unwrap_or_default();
            let next = match action {
                VolumeCmd::Show => {
                    println!("Volume: {} [{}]", current.to_storage(), meter(current));
                    return;
                }
                VolumeCmd::Up => current.up(config.volume_step),
                VolumeCmd::Down => current.down(config.volume_step),
                VolumeCmd::Set { level } => Volume::new(level),
            };
            if let Err(e) = next.save(&mut store) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            println!("Volume: {} [{}]", next.to_storage(), meter(next));
        }
    }
}

fn now_secs() -> u32 {
    interval::seconds_of_day(chrono::Local::now().time()) % DAY_SECONDS
}

fn parse_or_exit(time: &str) -> u32 {
    interval::parse_clock(time).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })
}

fn load_configured_tracks(config: &Config) -> Result<Vec<TrackInfo>, String> {
    match &config.tracks_file {
        Some(path) => tracks::load_tracks(Path::new(path)),
        None => Ok(Vec::new()),
    }
}

/// Print log entries from `since` on; returns the next index to print.
fn print_logs<P: day_radio::playback::PlaybackAdapter>(radio: &DayRadio<P>, since: usize) -> usize {
    for entry in radio.logs.get(since) {
        let line = format!("[{}] {:5} {}", entry.timestamp, entry.level, entry.message);
        if entry.level == "info" {
            println!("{}", line);
        } else {
            eprintln!("{}", line);
        }
    }
    radio.logs.next_index()
}

fn meter(volume: Volume) -> String {
    let lit = volume.meter_segments();
    format!("{}{}", "#".repeat(lit), ".".repeat(10 - lit.min(10)))
}

/// Translate stdin lines into radio events on a background thread.
fn spawn_stdin_reader(handle: RadioHandle) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            let event = match line.split_once(' ') {
                Some(("s", time)) => match interval::parse_clock(time.trim()) {
                    Ok(secs) => Some(RadioEvent::SeekTo(secs)),
                    Err(e) => {
                        eprintln!("{}", e);
                        None
                    }
                },
                Some(("c", px)) => px.trim().parse().ok().map(RadioEvent::Click),
                Some(("w", px)) => px.trim().parse().ok().map(RadioEvent::Resize),
                _ => match line {
                    "" | "p" => Some(RadioEvent::TogglePlayback),
                    "+" => Some(RadioEvent::VolumeUp),
                    "-" => Some(RadioEvent::VolumeDown),
                    "start" => Some(RadioEvent::PressStart),
                    "q" | "quit" => Some(RadioEvent::Shutdown),
                    _ => {
                        eprintln!("Unknown command '{}'", line);
                        None
                    }
                },
            };
            if let Some(event) = event {
                let quit = event == RadioEvent::Shutdown;
                if !handle.send(event) || quit {
                    break;
                }
            }
        }
    });
}
