//! Frame data structures for camera frames handed to the pipeline
//!
//! A [`Frame`] owns one pooled buffer for exactly one processing cycle. The
//! buffer goes back to its [`FrameRecycler`] when the frame is dropped or
//! explicitly released, whichever comes first, and only once.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::warn;

/// Errors raised while describing a frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Rotation is not a quarter turn
    #[error("unsupported rotation of {0} degrees (expected 0, 90, 180 or 270)")]
    InvalidRotation(u32),
}

/// Sensor rotation reported alongside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Parse a rotation from degrees
    pub fn from_degrees(degrees: u32) -> Result<Self, FrameError> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(FrameError::InvalidRotation(other)),
        }
    }

    /// Rotation in degrees
    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Whether the upright image has width and height swapped
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Receives buffers back from frames once they are released
pub trait FrameRecycler: Send + Sync {
    fn recycle(&self, buffer: Vec<u8>);
}

/// A camera frame owned by the pipeline for one cycle
pub struct Frame {
    /// Monotonic sequence number assigned by the source
    sequence: u64,
    /// Pooled pixel buffer, `None` only while being recycled
    buffer: Option<Vec<u8>>,
    /// Frame width in pixels
    width: u32,
    /// Frame height in pixels
    height: u32,
    /// Sensor rotation relative to the upright image
    rotation: Rotation,
    /// Timestamp when the frame was acquired
    timestamp: Instant,
    recycler: Arc<dyn FrameRecycler>,
}

impl Frame {
    /// Wrap a pooled buffer into a frame
    pub fn new(
        sequence: u64,
        buffer: Vec<u8>,
        width: u32,
        height: u32,
        rotation: Rotation,
        recycler: Arc<dyn FrameRecycler>,
    ) -> Self {
        Self {
            sequence,
            buffer: Some(buffer),
            width,
            height,
            rotation,
            timestamp: Instant::now(),
            recycler,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Raw pixel data
    pub fn data(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or(&[])
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Return the buffer to its pool. Consumes the frame.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.recycler.recycle(buffer);
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation", &self.rotation)
            .field("bytes", &self.data().len())
            .finish()
    }
}

/// Fixed-size pool of frame buffers
///
/// Buffers that are never released are never handed out again, so a leaking
/// consumer eventually starves the source.
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    capacity: usize,
}

impl BufferPool {
    /// Create a pool of `capacity` buffers of `buffer_len` bytes each
    pub fn new(capacity: usize, buffer_len: usize) -> Arc<Self> {
        let free = (0..capacity).map(|_| vec![0u8; buffer_len]).collect();
        Arc::new(Self {
            free: Mutex::new(free),
            capacity,
        })
    }

    /// Take a buffer out of the pool, if one is free
    pub fn acquire(&self) -> Option<Vec<u8>> {
        self.free.lock().pop()
    }

    /// Acquire a buffer and wrap it in a frame that recycles into this pool
    pub fn frame(
        self: &Arc<Self>,
        sequence: u64,
        width: u32,
        height: u32,
        rotation: Rotation,
    ) -> Option<Frame> {
        let buffer = self.acquire()?;
        let recycler: Arc<dyn FrameRecycler> = self.clone();
        Some(Frame::new(sequence, buffer, width, height, rotation, recycler))
    }

    /// Number of buffers currently on loan
    pub fn outstanding(&self) -> usize {
        self.capacity - self.free.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl FrameRecycler for BufferPool {
    fn recycle(&self, buffer: Vec<u8>) {
        let mut free = self.free.lock();
        if free.len() >= self.capacity {
            warn!("Buffer pool already full, discarding foreign buffer");
            return;
        }
        free.push(buffer);
    }
}
