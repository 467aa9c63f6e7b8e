//! Keep-only-latest frame hand-off between the camera and the pipeline
//!
//! The slot holds at most one pending frame. Offering a new frame while one is
//! still pending replaces it, and the replaced frame is released on the
//! source side, so the consumer only ever sees the most recent frame.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::capture::frame::Frame;

/// Result of offering a frame to the slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The slot was empty
    Queued,
    /// An older pending frame was released to make room
    Replaced,
    /// The pipeline is gone; the frame was released immediately
    Closed,
}

struct SlotState {
    pending: Option<Frame>,
    closed: bool,
    replaced: u64,
}

struct Shared {
    state: Mutex<SlotState>,
    notify: Notify,
}

/// Producer half of the slot
pub struct FrameSender {
    shared: Arc<Shared>,
}

/// Consumer half of the slot
pub struct FrameReceiver {
    shared: Arc<Shared>,
}

/// Create a connected sender/receiver pair
pub fn frame_slot() -> (FrameSender, FrameReceiver) {
    let shared = Arc::new(Shared {
        state: Mutex::new(SlotState {
            pending: None,
            closed: false,
            replaced: 0,
        }),
        notify: Notify::new(),
    });
    (
        FrameSender {
            shared: shared.clone(),
        },
        FrameReceiver { shared },
    )
}

impl FrameSender {
    /// Hand a frame to the pipeline, replacing any frame it has not picked up yet
    pub fn offer(&self, frame: Frame) -> Offer {
        let (outcome, stale) = {
            let mut state = self.shared.state.lock();
            if state.closed {
                (Offer::Closed, Some(frame))
            } else {
                let stale = state.pending.replace(frame);
                if stale.is_some() {
                    state.replaced += 1;
                    (Offer::Replaced, stale)
                } else {
                    (Offer::Queued, None)
                }
            }
        };
        // Released outside the slot lock
        drop(stale);
        if outcome != Offer::Closed {
            self.shared.notify.notify_one();
        }
        outcome
    }

    /// Number of frames released without ever reaching the pipeline
    pub fn dropped(&self) -> u64 {
        self.shared.state.lock().replaced
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Stop delivery; the receiver drains the pending frame then ends
    pub fn close(&self) {
        self.shared.state.lock().closed = true;
        self.shared.notify.notify_one();
    }
}

impl Drop for FrameSender {
    fn drop(&mut self) {
        self.close();
    }
}

impl FrameReceiver {
    /// Wait for the next frame. Returns `None` once the sender closed and the slot is empty.
    pub async fn recv(&mut self) -> Option<Frame> {
        loop {
            {
                let mut state = self.shared.state.lock();
                if let Some(frame) = state.pending.take() {
                    return Some(frame);
                }
                if state.closed {
                    return None;
                }
            }
            self.shared.notify.notified().await;
        }
    }

    /// Take the pending frame without waiting
    #[cfg(test)]
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.shared.state.lock().pending.take()
    }
}

impl Drop for FrameReceiver {
    fn drop(&mut self) {
        let stale = {
            let mut state = self.shared.state.lock();
            state.closed = true;
            state.pending.take()
        };
        drop(stale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::{BufferPool, Rotation};
    use std::time::Duration;

    #[test]
    fn test_only_latest_frame_is_delivered() {
        let pool = BufferPool::new(4, 8);
        let (sender, mut receiver) = frame_slot();

        assert_eq!(sender.offer(pool.frame(1, 2, 2, Rotation::Deg0).unwrap()), Offer::Queued);
        assert_eq!(sender.offer(pool.frame(2, 2, 2, Rotation::Deg0).unwrap()), Offer::Replaced);
        assert_eq!(sender.offer(pool.frame(3, 2, 2, Rotation::Deg0).unwrap()), Offer::Replaced);

        // Stale frames were released by the source
        assert_eq!(pool.outstanding(), 1);
        assert_eq!(sender.dropped(), 2);

        let frame = receiver.try_recv().unwrap();
        assert_eq!(frame.sequence(), 3);
        assert!(receiver.try_recv().is_none());

        drop(frame);
        assert_eq!(pool.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_recv_waits_for_frame() {
        let pool = BufferPool::new(2, 8);
        let (sender, mut receiver) = frame_slot();

        let producer_pool = pool.clone();
        let producer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            sender.offer(producer_pool.frame(42, 2, 2, Rotation::Deg0).unwrap());
            sender
        });

        let frame = receiver.recv().await.unwrap();
        assert_eq!(frame.sequence(), 42);
        let _sender = producer.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_slot_drains_then_ends() {
        let pool = BufferPool::new(2, 8);
        let (sender, mut receiver) = frame_slot();

        sender.offer(pool.frame(1, 2, 2, Rotation::Deg0).unwrap());
        drop(sender);

        assert_eq!(receiver.recv().await.unwrap().sequence(), 1);
        assert!(receiver.recv().await.is_none());
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_offer_after_receiver_dropped_releases_frame() {
        let pool = BufferPool::new(2, 8);
        let (sender, receiver) = frame_slot();

        sender.offer(pool.frame(1, 2, 2, Rotation::Deg0).unwrap());
        drop(receiver);
        assert_eq!(pool.outstanding(), 0);

        let outcome = sender.offer(pool.frame(2, 2, 2, Rotation::Deg0).unwrap());
        assert_eq!(outcome, Offer::Closed);
        assert_eq!(pool.outstanding(), 0);
        assert!(sender.is_closed());
    }
}
