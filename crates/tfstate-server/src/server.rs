use tokio::net::TcpListener;

use crate::bootstrap::build_state;
use crate::config::ServiceConfig;
use crate::error::ServerResult;
use crate::router::build_router;
use crate::state::AppState;

/// tfstate HTTP backend server.
pub struct TfstateServer {
    config: ServiceConfig,
    state: AppState,
}

impl TfstateServer {
    pub fn new(config: ServiceConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Connect the configured stores and build the server.
    pub async fn from_config(config: ServiceConfig) -> ServerResult<Self> {
        let state = build_state(&config).await?;
        Ok(Self::new(config, state))
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.config.server.max_body_bytes)
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.config.server.bind_addr).await?;
        tracing::info!(
            addr = %self.config.server.bind_addr,
            environment = %self.config.environment,
            "tfstate server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("tfstate server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
