//! Single-slot, latest-value-wins mailbox for one viewer connection.
//!
//! This is deliberately lossy: while the owning viewer is busy, every new
//! slide number overwrites the pending one, so only the most recent value
//! is ever delivered. Memory stays at one slot no matter how fast the
//! presenter navigates.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::protocol::SlideNumber;

#[derive(Debug, Default)]
pub struct Mailbox {
    slot: Mutex<Option<SlideNumber>>,
    ready: Notify,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a slide number. Never blocks.
    ///
    /// A waiter parked in [`await_update`](Self::await_update) is woken and
    /// takes the value straight away; otherwise it replaces whatever is
    /// pending.
    pub fn deliver(&self, slide: SlideNumber) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(slide);
        self.ready.notify_one();
    }

    /// Wait up to `timeout` for a slide number. `None` means nothing arrived.
    ///
    /// Single consumer: only the connection task that owns this mailbox may
    /// call it.
    pub async fn await_update(&self, timeout: Duration) -> Option<SlideNumber> {
        if let Some(slide) = self.take() {
            return Some(slide);
        }

        let deadline = Instant::now() + timeout;
        loop {
            if tokio::time::timeout_at(deadline, self.ready.notified())
                .await
                .is_err()
            {
                return self.take();
            }
            // A permit left over from a value already drained by the fast
            // path wakes us with an empty slot; keep waiting.
            if let Some(slide) = self.take() {
                return Some(slide);
            }
        }
    }

    /// Drain the pending slot without waiting.
    pub fn take(&self) -> Option<SlideNumber> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
