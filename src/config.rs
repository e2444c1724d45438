//! Environment-driven server configuration, read once at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const APP_NAME: &str = "Recalla";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "info,recalla=debug".to_string()
}

/// Runtime configuration for the back-office server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Path of the SQLite database file.
    pub database_path: PathBuf,
    /// Shared secret the external scheduler must present in
    /// `X-Scheduler-Secret` on the recall trigger endpoints.
    pub scheduler_secret: String,
    /// Telegram bot token for the outbound notification channel.
    /// `None` selects the disabled channel (every send fails).
    pub telegram_bot_token: Option<String>,
    /// Dispatch settings for the recall engine.
    pub dispatch: DispatchConfig,
}

/// Bounds for one scheduler tick.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Maximum clinics processed concurrently.
    pub workers: usize,
    /// Per-send timeout on the notification channel.
    pub send_timeout: Duration,
    /// Overall tick deadline; when it passes, no new sends are issued.
    pub tick_deadline: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            send_timeout: Duration::from_secs(10),
            tick_deadline: Some(Duration::from_secs(300)),
        }
    }
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Returns an error string naming the missing/invalid variable so `main`
    /// can fail fast with a useful message.
    pub fn from_env() -> Result<Self, String> {
        let bind_addr = env_or("RECALLA_BIND", "127.0.0.1:8080");
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .map_err(|e| format!("RECALLA_BIND invalid ({bind_addr}): {e}"))?;

        let database_path = PathBuf::from(env_or("RECALLA_DB", "recalla.db"));

        let scheduler_secret = std::env::var("RECALLA_SCHEDULER_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or("RECALLA_SCHEDULER_SECRET must be set and non-empty")?;

        let telegram_bot_token = std::env::var("RECALLA_TELEGRAM_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());

        let defaults = DispatchConfig::default();
        let dispatch = DispatchConfig {
            workers: parse_env("RECALLA_DISPATCH_WORKERS", defaults.workers)?.max(1),
            send_timeout: Duration::from_secs(parse_env(
                "RECALLA_SEND_TIMEOUT_SECS",
                defaults.send_timeout.as_secs(),
            )?),
            tick_deadline: match parse_env("RECALLA_TICK_DEADLINE_SECS", 300u64)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        };

        Ok(Self {
            bind_addr,
            database_path,
            scheduler_secret,
            telegram_bot_token,
            dispatch,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.is_empty() => raw
            .parse()
            .map_err(|e| format!("{name} invalid ({raw}): {e}")),
        _ => Ok(default),
    }
}
