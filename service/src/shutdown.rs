//! Signal-driven shutdown coordination.

use tokio::signal;
use tokio::sync::broadcast;

/// Fans a single shutdown trigger out to every subsystem.
///
/// Subsystems call [`subscribe`](ShutdownController::subscribe) and
/// `select!` the receiver against their main loop. The trigger fires either
/// programmatically or when the process receives SIGINT/SIGTERM.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver that resolves once shutdown is triggered.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger shutdown now.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Block until SIGINT or SIGTERM arrives, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
        }

        self.trigger();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_reaches_all_subscribers() {
        let controller = ShutdownController::new();
        let mut rx1 = controller.subscribe();
        let mut rx2 = controller.subscribe();
        controller.trigger();
        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn pending_signal_is_buffered_per_receiver() {
        let controller = ShutdownController::new();
        let mut rx = controller.subscribe();
        controller.trigger();
        // The channel buffers the one pending signal for this receiver.
        assert!(rx.recv().await.is_ok());
    }
}
