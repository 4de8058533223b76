//! Graceful shutdown for the hub.
//!
//! On a termination signal every live connection is cancelled so its write
//! loop sends a close frame, then the HTTP server stops accepting requests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::signal;
use tokio::time::timeout;

use crate::connection_manager::ConnectionManager;

/// Configuration for graceful shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time to wait for connections to leave the registry (default: 5 seconds)
    pub drain_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(5),
        }
    }
}

/// Closes every connection of a running hub
pub struct GracefulShutdown {
    connection_manager: Arc<ConnectionManager>,
    config: ShutdownConfig,
}

impl GracefulShutdown {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self::with_config(connection_manager, ShutdownConfig::default())
    }

    pub fn with_config(connection_manager: Arc<ConnectionManager>, config: ShutdownConfig) -> Self {
        Self {
            connection_manager,
            config,
        }
    }

    #[tracing::instrument(
        name = "graceful_shutdown",
        skip(self),
        fields(total_connections = self.connection_manager.stats().total_connections)
    )]
    pub async fn execute(&self, reason: &str) -> ShutdownResult {
        let start = Instant::now();

        tracing::info!(reason = %reason, "Closing all connections");
        let connections_closed = self.connection_manager.close_all();

        // Connections registered while closing are picked up here
        let drained = timeout(self.config.drain_timeout, async {
            loop {
                if self.connection_manager.stats().total_connections == 0 {
                    break;
                }
                self.connection_manager.close_all();
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .is_ok();

        let result = ShutdownResult {
            connections_closed,
            drained,
            duration: start.elapsed(),
        };

        if !drained {
            tracing::warn!(
                remaining_connections = self.connection_manager.stats().total_connections,
                "Some connections did not close"
            );
        }

        tracing::info!(
            connections_closed = result.connections_closed,
            duration_ms = result.duration.as_millis(),
            "Graceful shutdown completed"
        );

        result
    }
}

/// Result of a graceful shutdown operation
#[derive(Debug, Default)]
pub struct ShutdownResult {
    pub connections_closed: usize,
    /// Whether the registry was empty before the drain timeout
    pub drained: bool,
    pub duration: Duration,
}

/// Resolve on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_shutdown_no_connections() {
        let shutdown = GracefulShutdown::new(Arc::new(ConnectionManager::new()));

        let result = shutdown.execute("test shutdown").await;

        assert!(result.drained);
        assert_eq!(result.connections_closed, 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_every_connection() {
        let manager = Arc::new(ConnectionManager::new());
        let (tx1, _rx1) = mpsc::channel(4);
        let (tx2, _rx2) = mpsc::channel(4);
        let a = manager.register(1, tx1);
        let b = manager.register(1, tx2);

        let result = GracefulShutdown::new(manager.clone()).execute("test").await;

        assert_eq!(result.connections_closed, 2);
        assert!(result.drained);
        assert!(a.is_closed() && b.is_closed());
        assert!(!manager.is_user_online(1));
    }

    #[test]
    fn test_shutdown_config_defaults() {
        assert_eq!(ShutdownConfig::default().drain_timeout, Duration::from_secs(5));
    }
}
