use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

/// Handle used by the pipeline to ask the owning process to shut down.
///
/// Signalling is idempotent: however many fatal errors arrive, listeners
/// observe a single transition.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

/// Receiving side, held by whoever owns the server lifecycle.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new() -> (Self, ShutdownListener) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, ShutdownListener { rx })
    }

    pub fn signal(&self) {
        if !self.tx.send_replace(true) {
            warn!("shutdown signalled");
        }
    }

    pub fn is_signalled(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl ShutdownListener {
    /// Resolves once shutdown has been signalled (or every signal handle
    /// is gone).
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|signalled| *signalled).await;
    }

    pub fn is_signalled(&self) -> bool {
        *self.rx.borrow()
    }
}
