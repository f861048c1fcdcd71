//! Nocturne - Nightcore/Daycore player and exporter
//!
//! This is the terminal front end for nocturne-core. It:
//! 1. Decodes the input file to a PCM buffer
//! 2. Plays it through the default output device at the dialed speed
//! 3. Drives transport commands from a line-based stdin loop
//! 4. Runs exports on the background export service
//!
//! ## Command line flags
//!
//! - `--daycore`, `--speed`, `--preset`: initial speed settings
//! - `--export`, `--bitrate`, `--artwork`, `--out`: export run
//! - `--no-play`: skip playback after an export run
//!
//! Persistent defaults load from a YAML config at startup; the settings
//! dialed in during an interactive session are saved back on exit.

mod args;
mod config;

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use nocturne_core::audio::{start_output, AudioSystem};
use nocturne_core::audio_file::{load_track, LoadedTrack};
use nocturne_core::config::{default_config_path, load_config, save_config};
use nocturne_core::engine::PlaybackController;
use nocturne_core::export::{ExportFormat, ExportProgress, ExportRequest, ExportService};
use nocturne_core::speed::SpeedPreset;
use nocturne_core::PlayState;

use config::PlayerConfig;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = match args::parse(&argv) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!();
            eprint!("{}", args::USAGE);
            std::process::exit(2);
        }
    };

    if cli.show_help {
        print!("{}", args::USAGE);
        return Ok(());
    }

    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("nocturne starting up");

    println!("╔══════════════════════════════════════════════╗");
    println!("║                   Nocturne                   ║");
    println!("║          Nightcore / Daycore player          ║");
    println!("╚══════════════════════════════════════════════╝");
    println!();

    let input = match cli.input {
        Some(ref path) => path.clone(),
        None => {
            eprintln!("No input file given.");
            eprintln!();
            eprint!("{}", args::USAGE);
            std::process::exit(2);
        }
    };

    // Load persisted defaults, then let command line flags override them
    let config_path = default_config_path();
    let mut config: PlayerConfig = load_config(&config_path);
    if let Some(mode) = cli.mode() {
        config.playback.mode = mode;
    }
    if let Some(value) = cli.slider_value {
        config.playback.slider_value = value;
    }
    if let Some(kbps) = cli.bitrate_kbps {
        config.export.bitrate_kbps = kbps;
    }
    if let Some(dir) = cli.out_dir.clone() {
        config.export.output_dir = dir;
    }
    log::info!(
        "Mode: {}, slider: {:.2}",
        config.playback.mode.label(),
        config.playback.slider_value
    );

    let track = match load_track(&input) {
        Ok(track) => Arc::new(track),
        Err(e) => {
            eprintln!("Could not load {:?}: {}", input, e);
            std::process::exit(1);
        }
    };
    println!(
        "Loaded \"{}\" ({:.1}s, {} Hz, {} channel(s))",
        track.title,
        track.buffer.duration_seconds(),
        track.buffer.sample_rate(),
        track.buffer.num_channels()
    );

    let artwork = match &cli.artwork {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read artwork {:?}", path))?;
            Some(bytes)
        }
        None => None,
    };

    // An export flag runs before any audio device is touched, so a
    // headless box can convert tracks with --export --no-play
    if let Some(format) = cli.export {
        let mut request = ExportRequest::new(
            format,
            config.playback.slider_value,
            config.playback.mode,
            track.title.clone(),
        );
        request.bitrate_kbps = config.export.bitrate_kbps;
        request.artwork = artwork.clone();

        if !run_export(track.clone(), request, &config.export.output_dir)? {
            std::process::exit(1);
        }
    }

    if cli.no_play {
        return Ok(());
    }

    // Try to open the default output device
    let system = match start_output() {
        Ok(system) => system,
        Err(e) => {
            eprintln!("Warning: Could not start audio output: {}", e);
            eprintln!("Running without playback; use --export to convert tracks.");
            return Ok(());
        }
    };
    println!("Audio output started ({} Hz)", system.sample_rate);

    let AudioSystem {
        handle,
        commands,
        atomics,
        ..
    } = system;
    let mut controller = PlaybackController::new(commands, atomics);
    controller.set_mode(config.playback.mode);
    controller.set_slider_value(config.playback.slider_value);
    controller.load(track.clone());
    controller.play();

    println!();
    println!("Transport: p (pause/resume), seek <s>, speed <v>, preset <name>, mode,");
    println!("           export <wav|mp3>, status, quit. Enter polls the position.");
    print_status(&mut controller);

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;

        if controller.poll_end() {
            println!("Track ended.");
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("p") | Some("pause") | Some("resume") => {
                controller.toggle_play();
                print_status(&mut controller);
            }
            Some("seek") => match parts.next().and_then(|v| v.parse::<f64>().ok()) {
                Some(seconds) => {
                    controller.seek(seconds);
                    print_status(&mut controller);
                }
                None => println!("Usage: seek <seconds>"),
            },
            Some("speed") => match parts.next().and_then(|v| v.parse::<f64>().ok()) {
                Some(value) => {
                    controller.set_slider_value(value);
                    print_status(&mut controller);
                }
                None => println!("Usage: speed <value>"),
            },
            Some("preset") => match parts.next().and_then(SpeedPreset::from_name) {
                Some(preset) => {
                    controller.set_slider_value(preset.slider_value());
                    print_status(&mut controller);
                }
                None => println!("Usage: preset <light|normal|heavy|extreme>"),
            },
            Some("mode") => {
                controller.toggle_mode();
                print_status(&mut controller);
            }
            Some("export") => match parts.next().and_then(ExportFormat::from_name) {
                Some(format) => {
                    // Export what the transport is currently dialed to
                    let mut request = ExportRequest::new(
                        format,
                        controller.slider_value(),
                        controller.mode(),
                        track.title.clone(),
                    );
                    request.bitrate_kbps = config.export.bitrate_kbps;
                    request.artwork = artwork.clone();
                    if let Err(e) = run_export(track.clone(), request, &config.export.output_dir)
                    {
                        eprintln!("{}", e);
                    }
                }
                None => println!("Usage: export <wav|mp3>"),
            },
            Some("status") | None => print_status(&mut controller),
            Some("q") | Some("quit") => break,
            Some(other) => println!("Unknown command: {}", other),
        }
    }

    controller.stop();

    // Persist the settings dialed in during the session
    config.playback.mode = controller.mode();
    config.playback.slider_value = controller.slider_value();
    if let Err(e) = save_config(&config, &config_path) {
        log::warn!("Failed to save config: {}", e);
    }

    // Keep the stream alive until we're done (it is dropped here)
    drop(handle);
    println!("Nocturne stopped.");

    Ok(())
}

/// Drive one export through the service, printing progress lines
///
/// Returns whether the export produced a file. Encoding failures are
/// already reported by the progress messages; only a filesystem error
/// on the final write becomes an `Err`.
fn run_export(
    track: Arc<LoadedTrack>,
    request: ExportRequest,
    out_dir: &Path,
) -> anyhow::Result<bool> {
    let service = ExportService::new();
    let progress = match service.start_export(Some(track), request) {
        Some(progress) => progress,
        None => return Ok(false),
    };

    let mut saved = false;
    for message in progress {
        println!("{}", message.description());
        if let ExportProgress::Complete { asset, .. } = message {
            let path = asset
                .write_to(out_dir)
                .with_context(|| format!("Failed to write export to {:?}", out_dir))?;
            println!("Saved {:?}", path);
            saved = true;
        }
    }

    Ok(saved)
}

/// One-line transport readout driven by the position clock
fn print_status(controller: &mut PlaybackController) {
    let state = match controller.state() {
        PlayState::Playing => "playing",
        PlayState::Paused => "paused",
        PlayState::Stopped => "stopped",
    };
    println!(
        "  {:.1}s / {:.1}s  [{}]  {} @ {:.2} (rate {:.2})",
        controller.position(),
        controller.duration_seconds(),
        state,
        controller.mode().label(),
        controller.slider_value(),
        controller.rate()
    );
}
