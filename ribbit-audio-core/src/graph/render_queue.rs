use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::models::events::ModemEvent;

/// Bounded, wait-free hand-off from the render contexts to the control thread.
///
/// Posting never blocks or allocates: the channel storage is allocated up
/// front, and a full queue only bumps a counter that the control thread
/// reports later.
#[derive(Debug, Clone)]
pub struct RenderQueue {
    sender: Sender<ModemEvent>,
    dropped: Arc<AtomicU64>,
}

impl RenderQueue {
    pub fn bounded(capacity: usize) -> (Self, Receiver<ModemEvent>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        let queue = Self {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (queue, receiver)
    }

    /// Returns false if the event could not be queued.
    pub fn post(&self, event: ModemEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Number of events dropped since the last call.
    pub fn take_dropped(&self) -> u64 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}
