//! Dashboard server implementation.

use crate::error::DashboardError;
use crate::routes;
use crate::state::AppState;
use tokio::net::TcpListener;

/// The dashboard server.
pub struct DashboardServer {
    state: AppState,
}

impl DashboardServer {
    /// Create a new dashboard server around prepared state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// The configured `host:port`.
    pub fn bind_address(&self) -> String {
        self.state.config().server.bind_address()
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> Result<(), DashboardError> {
        let addr = self.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| DashboardError::StartupFailed(format!("{addr}: {e}")))?;
        tracing::info!(address = %addr, "Starting tursopanel API");

        let app = routes::create_router(self.state);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DashboardError::StartupFailed(e.to_string()))?;

        tracing::info!("tursopanel API stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
