//! Debounce Timer
//!
//! A single-shot delayed action. Arming always aborts the pending action
//! first, so at most one is outstanding.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    ticket: u64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            ticket: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Abort any pending action and schedule `action` after the delay.
    ///
    /// The action receives the ticket of this arming; it should call
    /// [`Debouncer::fired`] with it before doing any work. Returns `None`
    /// when called outside a tokio runtime, in which case nothing is
    /// scheduled.
    pub fn arm<F, Fut>(&mut self, action: F) -> Option<u64>
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let Ok(handle) = Handle::try_current() else {
            log::warn!("No async runtime available, debounced action not scheduled");
            return None;
        };

        self.ticket += 1;
        let ticket = self.ticket;
        let delay = self.delay;
        let task = action(ticket);

        self.pending = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));

        Some(ticket)
    }

    /// Abort the pending action, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Claim a firing. Returns `false` for a stale ticket (the timer was
    /// re-armed or cancelled after this action started); on success the
    /// running action is detached so a later re-arm cannot abort it.
    pub fn fired(&mut self, ticket: u64) -> bool {
        if ticket != self.ticket || self.pending.is_none() {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
