//! Result sinks used by the relay

use async_trait::async_trait;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{ResultSink, TransportError};

/// Sink writing payloads into a channel drained by the peer link
///
/// A dropped receiver means the peer went away.
pub struct ChannelSink {
    sender: Sender<Vec<u8>>,
    permission_granted: AtomicBool,
}

impl ChannelSink {
    pub fn new(sender: Sender<Vec<u8>>) -> Self {
        Self {
            sender,
            permission_granted: AtomicBool::new(true),
        }
    }

    pub fn with_permission(self, granted: bool) -> Self {
        self.set_permission(granted);
        self
    }

    /// Grant or revoke the send permission at runtime
    pub fn set_permission(&self, granted: bool) {
        self.permission_granted.store(granted, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResultSink for ChannelSink {
    async fn notify(&self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.permission_granted.load(Ordering::SeqCst) {
            return Err(TransportError::NoPermission);
        }
        self.sender
            .send(payload.to_vec())
            .map_err(|_| TransportError::NoConnectedPeer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (tx, rx) = unbounded();
        let sink = ChannelSink::new(tx);

        sink.notify(b"EXIT").await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), b"EXIT".to_vec());
    }

    #[tokio::test]
    async fn test_channel_sink_without_permission() {
        let (tx, rx) = unbounded();
        let sink = ChannelSink::new(tx).with_permission(false);

        assert_eq!(sink.notify(b"EXIT").await, Err(TransportError::NoPermission));
        assert!(rx.try_recv().is_err());

        sink.set_permission(true);
        assert!(sink.notify(b"EXIT").await.is_ok());
    }

    #[tokio::test]
    async fn test_channel_sink_without_peer() {
        let (tx, rx) = unbounded();
        drop(rx);
        let sink = ChannelSink::new(tx);

        assert_eq!(
            sink.notify(b"EXIT").await,
            Err(TransportError::NoConnectedPeer)
        );
    }
}
