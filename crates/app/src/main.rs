use std::path::PathBuf;

use beat_sync_core::{AnalysisConfig, AudioBuffer, BeatEngine, BeatSyncError, TickOutcome};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE: u32 = 8_000;

fn main() -> beat_sync_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            bpm,
            seconds,
            output,
        } => run_analyze(bpm, seconds, output),
        Commands::Simulate {
            bpm,
            seconds,
            tick_rate,
        } => run_simulate(bpm, seconds, tick_rate),
    }
}

/// Analyzes a synthetic click track and prints the detected beat times.
fn run_analyze(bpm: f32, seconds: f32, output: Option<PathBuf>) -> beat_sync_core::Result<()> {
    tracing::info!(bpm, seconds, "analyzing synthetic click track");

    let mut engine = BeatEngine::new(demo_config())?;
    let index = engine.push_track(click_track(bpm, seconds));
    let beats = engine.analyze_track(index)?;

    tracing::info!(count = beats.len(), "analysis complete");
    for time in beats.as_slice() {
        println!("{time:.3}");
    }

    if let Some(path) = output {
        let json = serde_json::to_string(beats).map_err(|e| BeatSyncError::msg(e.to_string()))?;
        std::fs::write(&path, json)?;
        tracing::info!(?path, "wrote timestamp cache");
    }
    Ok(())
}

/// Drives a simulated playback session tick by tick and reports each event.
fn run_simulate(bpm: f32, seconds: f32, tick_rate: f32) -> beat_sync_core::Result<()> {
    tracing::info!(bpm, seconds, tick_rate, "simulating playback");

    let mut engine = BeatEngine::new(demo_config())?;
    engine.push_track(click_track(bpm, seconds));
    engine.push_track(click_track(bpm * 0.5, seconds));
    engine.analyze_all()?;

    let dt = 1.0 / tick_rate;
    let mut clock = 0.0f32;
    let mut beats = 0usize;
    loop {
        let playing = clock < seconds;
        match engine.tick(clock, playing) {
            TickOutcome::BeatFired => {
                beats += 1;
                tracing::info!(clock, "beat");
            }
            TickOutcome::TrackChanged(next) => {
                tracing::info!(next, "track changed");
                break;
            }
            TickOutcome::NoEvent => {}
        }
        clock += dt;
    }

    tracing::info!(beats, "session finished");
    Ok(())
}

/// A bar of silence with a short full-scale burst on every beat.
fn click_track(bpm: f32, seconds: f32) -> AudioBuffer {
    let total = (seconds * SAMPLE_RATE as f32) as usize;
    let mut samples = vec![0.0f32; total];

    let beat_period = 60.0 / bpm.max(1.0);
    let click_len = (SAMPLE_RATE as f32 * 0.01) as usize;
    let mut beat_start = 0.0f32;
    while beat_start < seconds {
        let start = (beat_start * SAMPLE_RATE as f32) as usize;
        for i in 0..click_len.min(total.saturating_sub(start)) {
            let t = i as f32 / SAMPLE_RATE as f32;
            samples[start + i] = (2.0 * std::f32::consts::PI * 220.0 * t).sin();
        }
        beat_start += beat_period;
    }

    AudioBuffer::new(samples, 1, SAMPLE_RATE)
}

fn demo_config() -> AnalysisConfig {
    AnalysisConfig {
        window_size: 256,
        hop_size: 128,
        history_size: 8,
        min_beat_interval: 0.25,
        ..AnalysisConfig::default()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline beat detection and playback sync", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a synthetic click track and print detected beat times.
    Analyze {
        /// Tempo of the generated click track.
        #[arg(long, default_value_t = 120.0)]
        bpm: f32,
        /// Length of the generated track in seconds.
        #[arg(long, default_value_t = 8.0)]
        seconds: f32,
        /// Optional path for a JSON timestamp cache.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a simulated playback session and log beat and track events.
    Simulate {
        /// Tempo of the generated click track.
        #[arg(long, default_value_t = 120.0)]
        bpm: f32,
        /// Length of each generated track in seconds.
        #[arg(long, default_value_t = 8.0)]
        seconds: f32,
        /// Simulated host tick rate in Hz.
        #[arg(long, default_value_t = 60.0)]
        tick_rate: f32,
    },
}
