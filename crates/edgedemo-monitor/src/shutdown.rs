//! Cooperative shutdown for monitor loops
//!
//! Every loop checks the signal at the top of a cycle and races it against
//! each fetch and the sleep between cycles. Dropping the trigger counts as a
//! shutdown.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Create a connected trigger / signal pair
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Fires the shutdown for every subscribed [`Shutdown`]
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving side handed to each monitor loop
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once shutdown has been requested
    pub async fn triggered(&mut self) {
        // Err means the trigger is gone, which is a shutdown as well
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    /// Drive `work` to completion unless shutdown comes first
    ///
    /// Returns `None` when `work` was dropped unfinished.
    pub async fn cancellable<F: Future>(&mut self, work: F) -> Option<F::Output> {
        if self.is_triggered() {
            return None;
        }

        tokio::select! {
            output = work => Some(output),
            _ = self.triggered() => None,
        }
    }

    /// Sleep for `duration` unless shutdown comes first.
    ///
    /// Returns `false` when the sleep was cut short.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.triggered() => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_trigger() {
        let (_trigger, mut signal) = channel();
        assert!(signal.sleep(Duration::from_secs(5)).await);
        assert!(!signal.is_triggered());
    }

    #[tokio::test]
    async fn test_trigger_interrupts_sleep() {
        let (trigger, mut signal) = channel();

        let sleeper = tokio::spawn(async move { signal.sleep(Duration::from_secs(3600)).await });
        tokio::task::yield_now().await;
        trigger.trigger();

        assert!(!sleeper.await.unwrap());
    }

    #[tokio::test]
    async fn test_trigger_abandons_pending_work() {
        let (trigger, mut signal) = channel();

        let worker = tokio::spawn(async move {
            signal
                .cancellable(std::future::pending::<()>())
                .await
        });
        tokio::task::yield_now().await;
        trigger.trigger();

        assert_eq!(worker.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cancellable_returns_finished_work() {
        let (_trigger, mut signal) = channel();
        assert_eq!(signal.cancellable(async { 42 }).await, Some(42));
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_trigger() {
        let (trigger, signal) = channel();
        drop(signal);
        trigger.trigger();

        assert!(trigger.subscribe().is_triggered());
    }

    #[tokio::test]
    async fn test_dropped_trigger_counts_as_shutdown() {
        let (trigger, mut signal) = channel();
        drop(trigger);

        assert!(signal.is_triggered());
        assert!(!signal.sleep(Duration::from_secs(1)).await);
    }
}
