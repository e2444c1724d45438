//! Outbound message channels.
//!
//! The dispatch coordinator only talks to [`NotificationChannel`]; the
//! concrete transport (Telegram today) is picked at startup from the
//! configuration. A send is confirmed only when the provider acknowledged
//! the message; callers must not treat an `Err` as "maybe delivered".

pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

pub use telegram::TelegramChannel;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider rejected the message ({code}): {description}")]
    Rejected { code: i64, description: String },
}

/// Provider acknowledgement for one delivered message.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub provider_message_id: Option<String>,
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver `text` to `destination` (a provider-specific handle, e.g. a
    /// Telegram chat id). Returns only after the provider confirmed or
    /// rejected the message.
    async fn send(&self, destination: &str, text: &str) -> Result<SendReceipt, NotifyError>;

    /// Short channel name for logs.
    fn name(&self) -> &'static str;
}

/// Stand-in when no transport is configured. Always fails, so nothing is
/// ever marked as sent without a real provider acknowledgement.
pub struct DisabledChannel;

#[async_trait]
impl NotificationChannel for DisabledChannel {
    async fn send(&self, _destination: &str, _text: &str) -> Result<SendReceipt, NotifyError> {
        Err(NotifyError::Transport(
            "no notification channel is configured".into(),
        ))
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}
