//! Server binary: configuration, database fail-fast, channel
//! selection, then the HTTP API until Ctrl-C.

use std::process::exit;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use recalla::api::{start_api_server, ApiContext};
use recalla::config::{self, Config};
use recalla::db;
use recalla::notify::{DisabledChannel, NotificationChannel, TelegramChannel};
use recalla::recall::RecallEngine;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            exit(1);
        }
    };

    // Open once before serving so schema and migration problems surface
    // now instead of on the first request.
    match db::open_database(&config.database_path) {
        Ok(_) => {
            tracing::info!(path = %config.database_path.display(), "Database ready")
        }
        Err(e) => {
            tracing::error!("Database error: {e}");
            exit(1);
        }
    }

    let channel: Arc<dyn NotificationChannel> = match &config.telegram_bot_token {
        Some(token) => Arc::new(TelegramChannel::new(token)),
        None => {
            tracing::warn!(
                "RECALLA_TELEGRAM_TOKEN not set; reminder sends will fail until it is"
            );
            Arc::new(DisabledChannel)
        }
    };
    tracing::info!(channel = channel.name(), "Notification channel selected");

    let engine = RecallEngine::new(config.database_path.clone(), channel, config.dispatch);
    let ctx = ApiContext::new(config.database_path, config.scheduler_secret, engine);

    let mut server = match start_api_server(ctx, config.bind_addr).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{e}");
            exit(1);
        }
    };

    tracing::info!(addr = %server.addr, "Recalla ready");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }

    tracing::info!("Shutting down");
    server.shutdown();
}
