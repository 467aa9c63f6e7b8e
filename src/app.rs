//! Application Coordinator
//!
//! Wires the camera, the scanning pipeline and the operator event log
//! together and runs them until the camera stops.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, select, unbounded, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::capture::{frame_slot, CaptureSummary, SyntheticCamera};
use crate::config::AppConfig;
use crate::pipeline::{LayoutProvider, ScanPipeline, SharedLayout};
use crate::shared::{PipelineEvent, PipelineStats};
use crate::transport::ResultSink;
use crate::vision::TextRecognizer;

/// Totals reported after a run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub capture: CaptureSummary,
    pub stats: PipelineStats,
    /// Frame buffers still on loan once everything stopped
    pub buffers_outstanding: usize,
}

/// Main application coordinator
pub struct ScanRelayApp {
    config: AppConfig,
    recognizer: Arc<dyn TextRecognizer>,
    sink: Arc<dyn ResultSink>,
    /// Layout the UI layer may update while running
    layout: Arc<SharedLayout>,
}

impl ScanRelayApp {
    /// Create a new application coordinator
    pub fn new(
        config: AppConfig,
        recognizer: Arc<dyn TextRecognizer>,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let layout = Arc::new(SharedLayout::new(
            config.target_region(),
            config.preview_size(),
        ));

        Ok(Self {
            config,
            recognizer,
            sink,
            layout,
        })
    }

    /// Layout handle for moving the target region while running
    pub fn layout(&self) -> Arc<SharedLayout> {
        self.layout.clone()
    }

    /// Run the camera and pipeline until `frame_limit` frames were produced or `cancel` fires
    pub async fn run(
        self,
        frame_limit: Option<u64>,
        cancel: CancellationToken,
    ) -> Result<RunReport> {
        let camera = SyntheticCamera::new(self.config.capture_config()?);
        let pool = camera.pool();
        let (sender, receiver) = frame_slot();
        let (event_tx, event_rx) = unbounded();

        let layout: Arc<dyn LayoutProvider> = self.layout.clone();
        let pipeline = ScanPipeline::new(
            self.recognizer,
            layout,
            self.sink,
            self.config.pipeline_settings(),
            event_tx,
        );

        let (log_shutdown, log_handle) = spawn_event_log(event_rx);
        let camera_handle = tokio::spawn(camera.run(sender, frame_limit, cancel));

        let stats = pipeline.run(receiver).await;
        let capture = camera_handle.await.context("Camera task failed")?;

        let _ = log_shutdown.send(());
        if log_handle.join().is_err() {
            warn!("Event log thread panicked");
        }

        let buffers_outstanding = pool.outstanding();
        if buffers_outstanding > 0 {
            warn!("{} frame buffers were never released", buffers_outstanding);
        }

        Ok(RunReport {
            capture,
            stats,
            buffers_outstanding,
        })
    }
}

/// Drain pipeline events on a background thread until told to stop
fn spawn_event_log(events: Receiver<PipelineEvent>) -> (crossbeam_channel::Sender<()>, JoinHandle<()>) {
    let (shutdown_tx, shutdown_rx) = bounded(1);

    let handle = std::thread::spawn(move || {
        loop {
            select! {
                recv(events) -> event => match event {
                    Ok(event) => log_event(&event),
                    Err(_) => break,
                },
                recv(shutdown_rx) -> _ => {
                    for event in events.try_iter() {
                        log_event(&event);
                    }
                    break;
                }
            }
        }
    });

    (shutdown_tx, handle)
}

/// Surface one pipeline event to the operator
fn log_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::Matched { sequence, text } => {
            info!("[frame {}] Recognized: {}", sequence, text)
        }
        PipelineEvent::Delivered { sequence, bytes } => {
            info!("[frame {}] Sent {} bytes to peer", sequence, bytes)
        }
        PipelineEvent::DeliveryFailed { sequence, error } => {
            warn!("[frame {}] Could not notify peer: {}", sequence, error)
        }
        PipelineEvent::RecognitionFailed { sequence, error } => {
            warn!("[frame {}] Text recognition failed: {}", sequence, error)
        }
        PipelineEvent::DegenerateRegion { sequence, error } => {
            error!("[frame {}] Target region unusable: {}", sequence, error)
        }
        PipelineEvent::Resumed => info!("Scanning resumed"),
    }
}
