//! Cooperative cancellation for in-flight chat turns.
//!
//! A [`CancelToken`] is threaded through the retriever, relay transport, and
//! stream consumer. Cancelling closes stream consumption and returns the
//! conversation to an idle state without committing a partial message.

use tokio::sync::watch;

/// Clonable cancellation token.
///
/// All clones observe the same cancellation; cancelling any clone cancels
/// them all. Cancellation is one-way and sticky.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create a new, un-cancelled token.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    /// Signal cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Suspend until cancellation is signalled.
    ///
    /// Completes immediately if the token is already cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // wait_for checks the current value before suspending, so a token
        // cancelled before the call resolves immediately
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
