//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use axum::Router;
use beacon_registry::{BroadcastStore, LivenessMonitor, RegistryService};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Beacon discovery server
pub struct Server {
    config: DaemonConfig,
    registry: Arc<RegistryService>,
    monitor: Arc<LivenessMonitor>,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: DaemonConfig) -> Self {
        Self::with_store(config, Arc::new(BroadcastStore::new()))
    }

    /// Create a server around an existing store
    pub fn with_store(config: DaemonConfig, store: Arc<BroadcastStore>) -> Self {
        let registry = Arc::new(RegistryService::new(
            store.clone(),
            config.registry.list_policy(),
        ));

        let monitor = Arc::new(LivenessMonitor::new(
            store,
            config.registry.liveness_policy(),
            config.registry.sweep_interval(),
        ));

        Self {
            config,
            registry,
            monitor,
        }
    }

    pub fn registry(&self) -> &Arc<RegistryService> {
        &self.registry
    }

    /// Router serving this server's registry
    pub fn router(&self) -> Router {
        create_router(AppState::new(self.registry.clone()), &self.config.server)
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    ///
    /// The liveness monitor runs for exactly as long as the HTTP server.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> DaemonResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let addr = listener.local_addr()?;

        tracing::info!("Beacon daemon listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let monitor_handle = self.monitor.clone().spawn(shutdown_rx);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| DaemonError::Server(e.to_string()));

        tracing::info!("Beacon daemon shutting down");

        // Stop the monitor even when serving failed
        let _ = shutdown_tx.send(true);
        if let Err(e) = monitor_handle.await {
            tracing::error!(error = %e, "Liveness monitor task failed");
        }

        served
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
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
