use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::observability::api_metrics;

/// Graceful shutdown coordinator for long-running commands
#[derive(Debug)]
pub struct ShutdownCoordinator {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Flip the shutdown flag on ctrl-c
    pub fn install_signal_handlers(&self) {
        info!("Installing signal handlers for graceful shutdown");
        let tx = Arc::clone(&self.tx);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, shutting down");
                    tx.send_replace(true);
                }
                Err(e) => warn!("Failed to listen for ctrl-c: {}", e),
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once shutdown has been requested
    pub async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Final bookkeeping before the process exits
    pub fn shutdown_all_services(metrics_enabled: bool) -> Result<()> {
        if metrics_enabled {
            api_metrics().log_stats();
        }
        info!("Graceful shutdown completed successfully");
        Ok(())
    }
}
