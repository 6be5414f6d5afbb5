//! Shutdown coordination for the relay.

use std::future::Future;
use std::io;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Coordinator for graceful shutdown.
///
/// Long-running tasks subscribe and resolve [`Shutdown::signalled`] on their
/// receiver.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every subscriber. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        let notified = self.tx.send(()).unwrap_or(0);
        tracing::info!(subscribers = notified, "Shutdown triggered");
        notified
    }

    /// Resolves once shutdown is triggered or the coordinator is dropped.
    pub async fn signalled(mut rx: broadcast::Receiver<()>) {
        let _ = rx.recv().await;
    }

    /// Wait for `signal`, then trigger shutdown and wait for `server` to drain.
    ///
    /// A server that exits first ends the wait and its error is returned.
    pub async fn supervise<S>(&self, mut server: JoinHandle<io::Result<()>>, signal: S) -> io::Result<()>
    where
        S: Future<Output = ()>,
    {
        tokio::select! {
            result = &mut server => {
                let result = result.map_err(io::Error::other).and_then(|r| r);
                if let Err(e) = &result {
                    tracing::error!(error = %e, "HTTP server failed");
                }
                return result;
            }
            _ = signal => {}
        }

        self.trigger();
        server.await.map_err(io::Error::other)?
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
