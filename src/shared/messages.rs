//! Diagnostic messages sent from the pipeline to the operator

use crate::transport::TransportError;
use crate::vision::{GeometryError, OcrError};

/// Notable pipeline occurrences, keyed by frame sequence number
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A text block matched the target region and scanning paused
    Matched { sequence: u64, text: String },
    /// The matched text reached the peer
    Delivered { sequence: u64, bytes: usize },
    /// The matched text could not be sent
    DeliveryFailed { sequence: u64, error: TransportError },
    /// The recognizer could not process a frame
    RecognitionFailed { sequence: u64, error: OcrError },
    /// The target region had no usable area in sensor space
    DegenerateRegion { sequence: u64, error: GeometryError },
    /// The cool-down elapsed and scanning resumed
    Resumed,
}
