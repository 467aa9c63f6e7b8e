//! ScanRelay - live camera text capture relayed to a paired peer
//!
//! Recognizes printed text inside an on-screen target region and forwards it
//! over a short-range notification link, pausing after each match so the same
//! text is not sent again on every frame.

mod app;
mod capture;
mod config;
mod pipeline;
mod shared;
mod storage;
mod transport;
mod vision;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::ScanRelayApp;
use crate::config::AppConfig;
use crate::transport::ChannelSink;
use crate::vision::{Rect, ScriptStep, ScriptedRecognizer, TextBlock};

/// ScanRelay - camera text capture with peer notification
#[derive(Parser, Debug)]
#[command(name = "scan-relay")]
#[command(about = "Recognize text inside a target region and relay it to a paired peer")]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the cool-down after a match, in milliseconds
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Number of camera frames to produce before stopping
    #[arg(long, default_value = "300")]
    frames: u64,

    /// JSON file of recognizer responses to replay
    #[arg(long)]
    script: Option<PathBuf>,

    /// Account for sensor rotation when mapping the target region
    #[arg(long)]
    apply_rotation: bool,

    /// Move the target region to LEFT,TOP,WIDTH,HEIGHT while running
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    move_region: Option<Vec<f32>>,

    /// Delay before the target region moves, in milliseconds
    #[arg(long, default_value = "2000")]
    move_after_ms: u64,

    /// Write the default configuration to this path and exit
    #[arg(long)]
    write_default_config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(path) = &args.write_default_config {
        config::save_config(&AppConfig::default(), path)
            .with_context(|| format!("Failed to write configuration to {:?}", path))?;
        info!("Wrote default configuration to {:?}", path);
        return Ok(());
    }

    info!("ScanRelay starting...");

    let mut config = load_or_create_config(args.config.as_deref());
    if let Some(cooldown_ms) = args.cooldown_ms {
        config.debounce.cooldown_ms = cooldown_ms;
    }
    if args.apply_rotation {
        config.region.apply_rotation = true;
    }

    let recognizer = match &args.script {
        Some(path) => ScriptedRecognizer::load(path)?,
        None => ScriptedRecognizer::new(demo_script()),
    }
    .with_latency(Duration::from_millis(40));
    let recognizer = Arc::new(recognizer);

    // Stand-in for the peer device: logs every notification it receives
    let (peer_tx, peer_rx) = crossbeam_channel::unbounded::<Vec<u8>>();
    let peer = std::thread::spawn(move || {
        for payload in peer_rx {
            info!("Peer received: {}", String::from_utf8_lossy(&payload));
        }
    });
    let sink = ChannelSink::new(peer_tx).with_permission(config.transport.permission_granted);

    let app = ScanRelayApp::new(config, recognizer.clone(), Arc::new(sink))?;

    // Stand-in for the UI dragging the target region mid-run
    if let Some(values) = &args.move_region {
        let &[left, top, width, height] = values.as_slice() else {
            bail!("--move-region expects LEFT,TOP,WIDTH,HEIGHT");
        };
        let target = Rect::from_xywh(left, top, width, height);
        let delay = Duration::from_millis(args.move_after_ms);
        let layout = app.layout();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!("Moving target region to {:?}", target);
            layout.set_target_region(target);
        });
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping camera");
            ctrl_c.cancel();
        }
    });

    let report = app.run(Some(args.frames), cancel).await?;
    if peer.join().is_err() {
        warn!("Peer thread panicked");
    }

    info!(
        "Camera: {} frames produced, {} replaced before pickup, {} skipped for lack of buffers",
        report.capture.produced, report.capture.replaced, report.capture.starved
    );
    info!(
        "Pipeline: {} received, {} recognized, {} matched, {} delivered, {} discarded while paused",
        report.stats.frames_received,
        report.stats.recognitions,
        report.stats.matches,
        report.stats.deliveries,
        report.stats.discarded_while_paused
    );
    info!(
        "Recognizer: {} calls, {} scripted responses unused",
        recognizer.calls(),
        recognizer.remaining()
    );
    if let Some(text) = &report.stats.last_match {
        info!("Last match: {}", text);
    }
    if report.stats.delivery_failures > 0 {
        warn!("{} notifications were not delivered", report.stats.delivery_failures);
    }
    if let Some(error) = &report.stats.last_error {
        warn!("Last error: {}", error);
    }

    info!("ScanRelay shutdown complete");

    Ok(())
}

/// Load configuration from file or fall back to defaults
fn load_or_create_config(explicit: Option<&Path>) -> AppConfig {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => storage::default_config_path().ok(),
    };

    if let Some(path) = path {
        if path.exists() {
            match config::load_config(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    return config;
                }
                Err(e) => warn!("Ignoring unreadable configuration {:?}: {}", path, e),
            }
        } else if explicit.is_some() {
            warn!("Configuration file {:?} not found", path);
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

/// Responses replayed when no script is given
fn demo_script() -> Vec<ScriptStep> {
    let block = |text: &str, bounds: Option<Rect>| TextBlock {
        text: text.to_string(),
        bounding_box: bounds,
    };

    vec![
        ScriptStep::Blocks { blocks: vec![] },
        ScriptStep::Blocks {
            blocks: vec![block("Platform 2", Some(Rect::new(600.0, 100.0, 900.0, 160.0)))],
        },
        ScriptStep::Failure {
            message: "frame too dark".to_string(),
        },
        ScriptStep::Blocks {
            blocks: vec![
                block("Way out", None),
                block("EXIT", Some(Rect::new(150.0, 480.0, 320.0, 540.0))),
                block("Platform 1", Some(Rect::new(200.0, 500.0, 480.0, 560.0))),
            ],
        },
        ScriptStep::Blocks {
            blocks: vec![block("Ticket office", Some(Rect::new(120.0, 490.0, 400.0, 530.0)))],
        },
    ]
}
