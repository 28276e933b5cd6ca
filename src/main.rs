// src/main.rs

mod actuator;
mod config;
mod control;
mod detection;
mod frame_clock;
mod frame_source;
mod pipeline;
mod snapshot;
mod types;

use actuator::Actuator;
use anyhow::{Context, Result};
use frame_clock::SystemClock;
use pipeline::{PipelineOrchestrator, RunStats, StopReason};
use snapshot::SnapshotSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use types::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ball_rover=info")),
        )
        .init();

    info!("🎾 Ball rover starting");

    let config_path = std::env::var("ROVER_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = Config::load(&config_path)?;
    info!("✓ Configuration loaded from {}", config_path);

    info!(
        "Control thresholds: close_x<{} turn_band=[{}, {}] intake_radius>{} max_radius={} scoop_hold={}s fps={}",
        config.control.close_x_threshold,
        config.control.turn_band_low,
        config.control.turn_band_high,
        config.control.min_intake_radius,
        config.control.max_valid_radius,
        config.control.scoop_hold_seconds,
        config.control.target_fps
    );

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current tick");
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    // The loop blocks on frame reads and sleeps, so it gets its own thread.
    let (reason, stats) = tokio::task::spawn_blocking(move || run(config, &stop))
        .await
        .context("Control loop thread panicked")??;

    info!(
        "✓ Rover stopped ({:?}) after {} ticks, {} scoop(s)",
        reason, stats.ticks, stats.scoops_started
    );
    Ok(())
}

fn run(config: Config, stop: &AtomicBool) -> Result<(StopReason, RunStats)> {
    let mut actuator = actuator::open(&config.actuator)?;
    // Park the outputs before the camera warm-up.
    actuator.stop_all().context("Failed to park actuators")?;
    info!("✓ Actuators parked");

    let source = frame_source::open(&config.source)?;
    info!("✓ Frame source ready");

    let detector = detection::open(&config)?;
    let snapshots = SnapshotSink::open(&config.snapshot)?;

    let mut rover = PipelineOrchestrator::new(
        &config.control,
        source,
        detector,
        actuator,
        SystemClock,
        snapshots,
    )?;
    rover.run(stop)
}
