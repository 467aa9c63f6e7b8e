//! Vision Layer
//!
//! Text recognition is an external collaborator consumed through
//! [`TextRecognizer`]. This module owns what the pipeline does around it:
//! mapping the target region into sensor space and gating the recognized
//! blocks against it.

pub mod gate;
pub mod geometry;
pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::Frame;

pub use geometry::{CoordinateMapper, GeometryError, Rect, Size};
pub use scripted::{ScriptStep, ScriptedRecognizer};

/// Text block returned by a recognizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Recognized text content
    pub text: String,
    /// Bounding box in sensor-image pixels, `None` when the block is unlocalized
    #[serde(default)]
    pub bounding_box: Option<Rect>,
}

/// Recognition failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OcrError {
    /// The engine ran but could not process the frame
    #[error("recognition failed: {0}")]
    Engine(String),
    /// The engine is not loaded or was shut down
    #[error("recognizer unavailable")]
    Unavailable,
}

/// Asynchronous text recognition service
///
/// Implementations borrow the frame for the duration of the call; releasing
/// it stays with the caller. The frame's rotation is available through
/// [`Frame::rotation`] for the engine's own decoding.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize text blocks, in an order defined by the engine
    async fn recognize(&self, frame: &Frame) -> Result<Vec<TextBlock>, OcrError>;

    /// Engine name for diagnostics
    fn name(&self) -> &str;
}
