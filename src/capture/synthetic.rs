//! Synthetic camera producing pooled frames at a fixed rate
//!
//! Stands in for the platform camera when running the relay without hardware.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{BufferPool, CaptureConfig, FrameSender, Offer};

/// Counters reported when the camera stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Frames offered to the pipeline
    pub produced: u64,
    /// Ticks skipped because every buffer was on loan
    pub starved: u64,
    /// Frames replaced in the slot before the pipeline picked them up
    pub replaced: u64,
}

/// Frame producer backed by a fixed buffer pool
pub struct SyntheticCamera {
    config: CaptureConfig,
    pool: Arc<BufferPool>,
}

impl SyntheticCamera {
    pub fn new(config: CaptureConfig) -> Self {
        let pool = BufferPool::new(config.buffer_pool_size, config.buffer_len());
        Self { config, pool }
    }

    /// Buffer pool frames are drawn from
    pub fn pool(&self) -> Arc<BufferPool> {
        self.pool.clone()
    }

    /// Produce frames until cancelled, the frame limit is reached, or the pipeline goes away
    pub async fn run(
        self,
        sender: FrameSender,
        frame_limit: Option<u64>,
        cancel: CancellationToken,
    ) -> CaptureSummary {
        let period = Duration::from_secs_f64(1.0 / f64::from(self.config.fps.max(1)));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Camera started: {}x{} @ {} fps, rotation {}°, {} buffers",
            self.config.frame_width,
            self.config.frame_height,
            self.config.fps,
            self.config.rotation.degrees(),
            self.pool.capacity()
        );

        let mut summary = CaptureSummary::default();
        let mut sequence = 0u64;

        loop {
            if frame_limit.is_some_and(|limit| summary.produced >= limit) {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            sequence += 1;
            let Some(frame) = self.pool.frame(
                sequence,
                self.config.frame_width,
                self.config.frame_height,
                self.config.rotation,
            ) else {
                summary.starved += 1;
                warn!(
                    "Buffer pool exhausted ({} on loan), skipping frame {}",
                    self.pool.outstanding(),
                    sequence
                );
                continue;
            };

            match sender.offer(frame) {
                Offer::Closed => {
                    debug!("Pipeline closed, camera stopping");
                    break;
                }
                Offer::Queued | Offer::Replaced => summary.produced += 1,
            }
        }

        summary.replaced = sender.dropped();
        info!(
            "Camera stopped: {} produced, {} replaced, {} starved",
            summary.produced, summary.replaced, summary.starved
        );
        summary
    }
}
