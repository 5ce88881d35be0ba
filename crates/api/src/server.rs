//! Server configuration and startup.

use std::net::SocketAddr;

use tracing::info;

use crate::routes;
use crate::state::AppState;

/// Configuration for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

/// The REST API server.
pub struct ApiServer {
    state: AppState,
    config: ServerConfig,
}

impl ApiServer {
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        Self { state, config }
    }

    /// Binds and serves until the process exits.
    ///
    /// # Errors
    /// Returns an error if binding or serving fails.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.config.bind).await?;
        info!(addr = %self.config.bind, "API server listening");
        axum::serve(listener, routes::router(self.state)).await
    }
}
