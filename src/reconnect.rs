//! Fixed-delay reconnection policy.
//!
//! After an unclean close there is exactly one pending attempt at a time.
//! Re-arming replaces the pending attempt; cancelling (manual reconnect,
//! teardown) aborts it. When the timer fires it sends the closed
//! connection's epoch back to the session controller, which re-enters its
//! start transition under a fresh epoch.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Schedules the single pending reconnection attempt.
#[derive(Debug)]
pub struct ReconnectPolicy {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl ReconnectPolicy {
    /// Create a policy with the given fixed delay.
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Arm (or re-arm) the pending attempt for `epoch`.
    pub fn schedule(&mut self, epoch: u64, due_tx: mpsc::UnboundedSender<u64>) {
        self.cancel();
        let delay = self.delay;
        debug!(epoch, delay_ms = delay.as_millis() as u64, "scheduling reconnect");
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = due_tx.send(epoch);
        }));
    }

    /// Cancel the pending attempt, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// The configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for ReconnectPolicy {
    fn drop(&mut self) {
        self.cancel();
    }
}
