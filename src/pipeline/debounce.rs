//! Pause/resume state machine throttling repeated detections
//!
//! `Scanning` is the initial state. A qualifying match moves it to `Paused`
//! and arms a one-shot resume timer at `now + cooldown`. When the deadline is
//! reached the state returns to `Scanning` whether or not any frame arrived
//! in between. All reads and writes go through one lock.

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::shared::PipelineEvent;

/// Whether frames are currently being recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Scanning,
    Paused { until: Instant },
}

struct Inner {
    state: PipelineState,
    /// Pending resume timer, aborted when the controller goes away
    timer: Option<AbortHandle>,
}

impl Inner {
    /// Return to scanning if paused until `deadline`. Returns true when this call resumed.
    fn resume_if(&mut self, deadline: Instant) -> bool {
        match self.state {
            PipelineState::Paused { until } if until == deadline => {
                self.state = PipelineState::Scanning;
                self.timer = None;
                true
            }
            _ => false,
        }
    }
}

/// Owner of the pipeline's Scanning/Paused state
pub struct DebounceController {
    inner: Arc<Mutex<Inner>>,
    cooldown: Duration,
    events: Option<Sender<PipelineEvent>>,
}

impl DebounceController {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: PipelineState::Scanning,
                timer: None,
            })),
            cooldown,
            events: None,
        }
    }

    /// Report resumes on `events`
    pub fn with_events(mut self, events: Sender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Snapshot of the current state
    #[cfg(test)]
    pub fn state(&self) -> PipelineState {
        self.inner.lock().state
    }

    /// Frame acceptance check. A deadline that already passed counts as resumed
    /// even if the timer task has not run yet.
    pub fn is_paused(&self) -> bool {
        let resumed = {
            let mut inner = self.inner.lock();
            let state = inner.state;
            match state {
                PipelineState::Scanning => return false,
                // The timer still fires later and finds nothing to do
                PipelineState::Paused { until } if Instant::now() >= until => {
                    inner.resume_if(until)
                }
                PipelineState::Paused { .. } => return true,
            }
        };
        if resumed {
            notify_resumed(self.events.as_ref());
        }
        false
    }

    /// Move from Scanning to Paused and arm the resume timer.
    ///
    /// Returns the deadline, or `None` if already paused. Must be called from
    /// within a tokio runtime.
    pub fn try_pause(&self) -> Option<Instant> {
        let mut inner = self.inner.lock();
        if matches!(inner.state, PipelineState::Paused { .. }) {
            return None;
        }

        let until = Instant::now() + self.cooldown;
        inner.state = PipelineState::Paused { until };

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        let events = self.events.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(until).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let resumed = inner.lock().resume_if(until);
            if resumed {
                notify_resumed(events.as_ref());
            }
        });
        inner.timer = Some(timer.abort_handle());

        debug!("Paused for {:?}", self.cooldown);
        Some(until)
    }
}

impl Drop for DebounceController {
    fn drop(&mut self) {
        if let Some(timer) = self.inner.lock().timer.take() {
            timer.abort();
        }
    }
}

fn notify_resumed(events: Option<&Sender<PipelineEvent>>) {
    info!("Cool-down elapsed, scanning resumed");
    if let Some(events) = events {
        let _ = events.send(PipelineEvent::Resumed);
    }
}
