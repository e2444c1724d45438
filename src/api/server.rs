//! API server lifecycle.
//!
//! Binds the configured address, mounts `api_router`, and runs axum in
//! a background tokio task. The returned handle owns a shutdown
//! channel; the spawned task drains in-flight requests after the
//! signal fires.

use std::net::SocketAddr;

use tokio::sync::oneshot;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Handle to a running API server.
pub struct ApiServer {
    /// Address actually bound. Differs from the configured one when the
    /// requested port was 0.
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Signal the server to stop. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }
}

/// Bind `bind` and serve the API until the handle's shutdown fires.
pub async fn start_api_server(ctx: ApiContext, bind: SocketAddr) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| format!("Failed to bind API server on {bind}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to read bound address: {e}"))?;

    let app = api_router(ctx);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}
