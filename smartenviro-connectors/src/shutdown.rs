//! Cooperative shutdown signal
//!
//! A single `watch` channel carries the stop request. The handle side is held
//! by whoever owns process lifetime (signal handler, test); every component
//! that waits holds a [`Shutdown`] and races its waits against it.
//!
//! Dropping the [`ShutdownHandle`] counts as a stop request: once nobody can
//! trigger shutdown any more there is nothing left to wait for.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Create a connected handle/listener pair
pub fn shutdown_channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx: Arc::new(tx) }, Shutdown { rx })
}

/// Trigger side of the shutdown signal
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Request shutdown; idempotent
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Another listener for the same signal
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Listener side of the shutdown signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// True once shutdown has been requested or the handle is gone
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolve when shutdown is requested
    pub async fn requested(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Sleep for `duration` unless shutdown comes first
    ///
    /// Returns `true` if the full duration elapsed, `false` if the sleep was
    /// cut short by a stop request.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_requested() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.requested() => false,
        }
    }
}
