//! Cooperative stop signal shared by schedulers and the CLI

use std::sync::Arc;
use tokio::sync::watch;

/// Broadcast "stop dispatching" flag
///
/// Clones share the flag. Once stopped it stays stopped.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    /// Create an unset signal
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request stop
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Whether stop was requested
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once stop is requested
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // the sender lives in self, so wait_for cannot fail here
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn clones_share_state() {
        let signal = StopSignal::new();
        let other = signal.clone();
        assert!(!other.is_stopped());
        signal.stop();
        assert!(other.is_stopped());
    }

    #[tokio::test]
    async fn stopped_wakes_waiters() {
        let signal = StopSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.stopped().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.stop();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn stopped_returns_immediately_when_already_set() {
        let signal = StopSignal::new();
        signal.stop();
        tokio::time::timeout(Duration::from_millis(100), signal.stopped())
            .await
            .unwrap();
    }
}
