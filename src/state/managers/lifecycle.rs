//! Lifecycle management state and behavior.
//!
//! The `LifecycleManager` carries the process-wide shutdown signal. Sessions
//! watch it next to their socket reads, so shutdown ends them through their
//! normal cleanup path rather than by aborting tasks.

use tokio::sync::watch;

pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    /// Signal shutdown to every current and future watcher.
    pub fn begin_shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Get a watcher for the shutdown signal.
    pub fn watcher(&self) -> ShutdownWatcher {
        ShutdownWatcher {
            rx: self.shutdown_tx.subscribe(),
        }
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the shutdown signal.
#[derive(Clone)]
pub struct ShutdownWatcher {
    rx: watch::Receiver<bool>,
}

impl ShutdownWatcher {
    /// Resolve once shutdown has begun. Resolves immediately if it already has.
    pub async fn signaled(&mut self) {
        // The sender lives in the hub for the whole process; if it is gone,
        // nothing will ever signal again and treating that as shutdown is correct.
        let _ = self.rx.wait_for(|down| *down).await;
    }
}
