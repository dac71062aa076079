//! Graceful shutdown controller for the worker.
//!
//! Listens for SIGINT/SIGTERM and broadcasts a shutdown signal to the
//! intake server and every proofing worker via a `tokio::sync::broadcast`
//! channel. Workers cancel their in-flight run on the signal.

use tokio::signal;
use tokio::sync::broadcast;

/// Coordinates graceful shutdown across the worker's tasks.
///
/// Tasks call [`subscribe`](Self::subscribe) to get a receiver, then
/// `select!` on it alongside their main loop.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Get a receiver that will be notified on shutdown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "cannot install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
