//! Batch cancellation
//!
//! A [`CancelHandle`] fires once; every [`Cancellation`] cloned from the same
//! pair observes it. Queries still paging when it fires resolve to
//! `QueryError::Cancelled`; finished queries keep their results.

use std::time::Duration;
use tokio::sync::watch;

/// Sending side of a cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Fire the signal
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Fire the signal after `delay` from a background task
    pub fn cancel_after(self, delay: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!(?delay, "Cancelling batch after timeout");
            self.cancel();
        })
    }
}

/// Receiving side of a cancellation signal
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
}

/// Create a linked handle / signal pair
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, Cancellation { rx: Some(rx) })
}

impl Cancellation {
    /// A signal that never fires
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Check if the signal has fired
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolve once the signal fires. Pending forever if it never can.
    pub async fn cancelled(&mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };

        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without firing
                return std::future::pending().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_fires() {
        let (handle, cancel) = cancellation();
        let mut waiter = cancel.clone();
        assert!(!cancel.is_cancelled());

        handle.cancel();
        assert!(cancel.is_cancelled());
        tokio::time::timeout(Duration::from_secs(1), waiter.cancelled())
            .await
            .expect("cancellation should resolve");
    }

    #[tokio::test]
    async fn test_never_stays_pending() {
        let mut cancel = Cancellation::never();
        assert!(!cancel.is_cancelled());
        let result = tokio::time::timeout(Duration::from_millis(20), cancel.cancelled()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dropped_handle_stays_pending() {
        let (handle, mut cancel) = cancellation();
        drop(handle);
        let result = tokio::time::timeout(Duration::from_millis(20), cancel.cancelled()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancel_after() {
        let (handle, mut cancel) = cancellation();
        handle.cancel_after(Duration::from_millis(10));
        tokio::time::timeout(Duration::from_secs(1), cancel.cancelled())
            .await
            .expect("timer should fire");
    }
}
