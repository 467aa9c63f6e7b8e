//! Frame-processing pipeline
//!
//! One cycle per frame:
//! 1. discard the frame if scanning is paused
//! 2. map the current target region into sensor space
//! 3. recognize text (the only suspension point)
//! 4. gate the blocks against the region and keep the first overlapping one
//! 5. on a match, pause and relay the text to the peer
//!
//! The frame is released exactly once on every path: explicitly right after
//! recognition, or by drop when the cycle returns early.

pub mod debounce;
pub mod layout;

use crossbeam_channel::Sender;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::capture::{Frame, FrameReceiver};
use crate::shared::{PipelineEvent, PipelineStats};
use crate::transport::{Delivery, NotificationRelay, ResultSink};
use crate::vision::{gate, CoordinateMapper, GeometryError, OcrError, TextRecognizer};

pub use debounce::DebounceController;
pub use layout::{LayoutProvider, SharedLayout};

/// Tunables for one pipeline instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    /// Margin trimmed from the top of the target region, in display units
    pub inset: f32,
    /// Account for quarter-turn sensor rotation when mapping the region
    pub apply_rotation: bool,
    /// Pause after a match
    pub cooldown: Duration,
    /// Largest notification payload in bytes
    pub max_payload_bytes: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            inset: 50.0,
            apply_rotation: false,
            cooldown: Duration::from_secs(5),
            max_payload_bytes: 512,
        }
    }
}

/// How a single frame's cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Scanning was paused; no recognition work was done
    DiscardedWhilePaused,
    /// The target region had no area in sensor space
    DegenerateRegion(GeometryError),
    /// The recognizer failed on this frame
    RecognitionFailed(OcrError),
    /// No block overlapped the target region
    NoMatch,
    /// A block matched and was relayed
    Matched { text: String, delivery: Delivery },
}

/// The scanning pipeline with its injected collaborators
pub struct ScanPipeline {
    recognizer: Arc<dyn TextRecognizer>,
    layout: Arc<dyn LayoutProvider>,
    relay: NotificationRelay,
    mapper: CoordinateMapper,
    debounce: Arc<DebounceController>,
    stats: Arc<RwLock<PipelineStats>>,
    events: Sender<PipelineEvent>,
}

impl ScanPipeline {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        layout: Arc<dyn LayoutProvider>,
        sink: Arc<dyn ResultSink>,
        settings: PipelineSettings,
        events: Sender<PipelineEvent>,
    ) -> Self {
        let debounce = DebounceController::new(settings.cooldown).with_events(events.clone());
        Self {
            recognizer,
            layout,
            relay: NotificationRelay::new(sink, settings.max_payload_bytes),
            mapper: CoordinateMapper::new(settings.inset, settings.apply_rotation),
            debounce: Arc::new(debounce),
            stats: Arc::new(RwLock::new(PipelineStats::default())),
            events,
        }
    }

    /// Shared counters
    #[cfg(test)]
    pub fn stats(&self) -> Arc<RwLock<PipelineStats>> {
        self.stats.clone()
    }

    /// Scanning/Paused state owner
    #[cfg(test)]
    pub fn debounce(&self) -> Arc<DebounceController> {
        self.debounce.clone()
    }

    /// Process frames one at a time until the source closes
    pub async fn run(self, mut frames: FrameReceiver) -> PipelineStats {
        info!(
            "Pipeline started with {} recognizer, cool-down {:?}",
            self.recognizer.name(),
            self.debounce.cooldown()
        );

        while let Some(frame) = frames.recv().await {
            self.process_frame(frame).await;
        }

        let stats = self.stats.read().clone();
        info!(
            "Pipeline stopped after {} frames ({} cycles completed): {} matches, {} discarded while paused",
            stats.frames_received,
            stats.completed_cycles(),
            stats.matches,
            stats.discarded_while_paused
        );
        stats
    }

    /// Run one cycle for `frame`
    pub async fn process_frame(&self, frame: Frame) -> CycleOutcome {
        let sequence = frame.sequence();
        self.stats.write().frames_received += 1;

        if self.debounce.is_paused() {
            debug!("Frame {}: paused, discarding", sequence);
            self.stats.write().discarded_while_paused += 1;
            return CycleOutcome::DiscardedWhilePaused;
        }

        let region = match self.mapper.map(
            self.layout.target_region(),
            self.layout.preview_size(),
            frame.dimensions(),
            frame.rotation(),
        ) {
            Ok(region) => region,
            Err(e) => {
                warn!("Frame {}: {}", sequence, e);
                {
                    let mut stats = self.stats.write();
                    stats.degenerate_regions += 1;
                    stats.set_error(e.to_string());
                }
                self.emit(PipelineEvent::DegenerateRegion {
                    sequence,
                    error: e.clone(),
                });
                return CycleOutcome::DegenerateRegion(e);
            }
        };

        self.stats.write().recognitions += 1;
        let result = self.recognizer.recognize(&frame).await;
        let age = frame.timestamp().elapsed();
        frame.release();

        let blocks = match result {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!("Frame {}: {}", sequence, e);
                {
                    let mut stats = self.stats.write();
                    stats.recognition_failures += 1;
                    stats.set_error(e.to_string());
                }
                self.emit(PipelineEvent::RecognitionFailed {
                    sequence,
                    error: e.clone(),
                });
                return CycleOutcome::RecognitionFailed(e);
            }
        };

        let block_count = blocks.len();
        debug!(
            "Frame {}: {} blocks recognized {:?} after capture",
            sequence, block_count, age
        );
        let Some(block) = gate::select(&region, blocks) else {
            debug!("Frame {}: no block inside target region", sequence);
            self.stats.write().no_match += 1;
            return CycleOutcome::NoMatch;
        };

        // Only one frame is ever in flight, so nothing can have paused since the check above
        if self.debounce.try_pause().is_none() {
            debug!("Frame {}: already paused, dropping match", sequence);
            self.stats.write().discarded_while_paused += 1;
            return CycleOutcome::DiscardedWhilePaused;
        }

        info!(
            "Frame {}: matched {:?}, pausing for {:?}",
            sequence,
            block.text,
            self.debounce.cooldown()
        );
        {
            let mut stats = self.stats.write();
            stats.matches += 1;
            stats.last_match = Some(block.text.clone());
        }
        self.emit(PipelineEvent::Matched {
            sequence,
            text: block.text.clone(),
        });

        let delivery = self.relay.relay(&block.text).await;
        match &delivery {
            Delivery::Sent { bytes } => {
                self.stats.write().deliveries += 1;
                self.emit(PipelineEvent::Delivered {
                    sequence,
                    bytes: *bytes,
                });
            }
            Delivery::Failed(e) => {
                {
                    let mut stats = self.stats.write();
                    stats.delivery_failures += 1;
                    stats.set_error(e.to_string());
                }
                self.emit(PipelineEvent::DeliveryFailed {
                    sequence,
                    error: e.clone(),
                });
            }
            Delivery::Skipped => {}
        }

        CycleOutcome::Matched {
            text: block.text,
            delivery,
        }
    }

    fn emit(&self, event: PipelineEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }
}
