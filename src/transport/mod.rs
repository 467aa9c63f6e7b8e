//! Notification Transport Layer
//!
//! Matched text leaves the pipeline through a [`ResultSink`], the outbound
//! "send" capability of the wireless link to the paired peer. Connection and
//! advertising are the link's own business; the pipeline only ever sends.

pub mod sinks;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub use sinks::ChannelSink;

/// Reasons a notification could not be delivered
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The link is not allowed to send
    #[error("missing permission to send notifications")]
    NoPermission,
    /// No peer is connected to receive the notification
    #[error("no connected peer")]
    NoConnectedPeer,
}

/// Outbound notification capability
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Send one notification payload to the peer
    async fn notify(&self, payload: &[u8]) -> Result<(), TransportError>;
}

/// Outcome of relaying one match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Payload handed to the link
    Sent { bytes: usize },
    /// Nothing left to send after trimming
    Skipped,
    /// The link refused the payload
    Failed(TransportError),
}

/// Turns matched text into notification payloads and hands them to the sink
pub struct NotificationRelay {
    sink: Arc<dyn ResultSink>,
    max_payload_bytes: usize,
}

impl NotificationRelay {
    pub fn new(sink: Arc<dyn ResultSink>, max_payload_bytes: usize) -> Self {
        Self {
            sink,
            max_payload_bytes,
        }
    }

    /// UTF-8 payload for `text`: trimmed, then cut at a character boundary
    /// to fit the payload limit. `None` when nothing remains.
    pub fn payload(&self, text: &str) -> Option<Vec<u8>> {
        let text = text.trim();
        let mut end = text.len().min(self.max_payload_bytes);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let text = &text[..end];
        (!text.is_empty()).then(|| text.as_bytes().to_vec())
    }

    /// Send `text` to the peer. Failures are logged and returned, never raised.
    pub async fn relay(&self, text: &str) -> Delivery {
        let Some(payload) = self.payload(text) else {
            debug!("Matched text is blank, nothing to send");
            return Delivery::Skipped;
        };

        match self.sink.notify(&payload).await {
            Ok(()) => {
                debug!("Sent {} byte notification", payload.len());
                Delivery::Sent {
                    bytes: payload.len(),
                }
            }
            Err(e) => {
                warn!("Notification not delivered: {}", e);
                Delivery::Failed(e)
            }
        }
    }
}
