//! Camera Capture Layer
//!
//! Frames arrive from the camera at sensor rate and are handed to the pipeline
//! through a keep-only-latest slot, so a slow consumer never backs up a queue
//! of stale frames.

pub mod frame;
pub mod slot;
pub mod synthetic;

pub use frame::{BufferPool, Frame, Rotation};
pub use slot::{frame_slot, FrameReceiver, FrameSender, Offer};
pub use synthetic::{CaptureSummary, SyntheticCamera};

/// Camera capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Frames per second delivered by the sensor
    pub fps: u32,
    /// Sensor image width in pixels
    pub frame_width: u32,
    /// Sensor image height in pixels
    pub frame_height: u32,
    /// Rotation reported with every frame
    pub rotation: Rotation,
    /// Number of pooled frame buffers
    pub buffer_pool_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            frame_width: 1080,
            frame_height: 1920,
            rotation: Rotation::Deg0,
            buffer_pool_size: 4,
        }
    }
}

impl CaptureConfig {
    /// Bytes per frame buffer (one 8-bit luma plane)
    pub fn buffer_len(&self) -> usize {
        self.frame_width as usize * self.frame_height as usize
    }
}
