use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{NotificationChannel, NotifyError, SendReceipt};

/// Telegram Bot API channel. Destinations are chat ids the patients opened
/// with the clinic's bot.
pub struct TelegramChannel {
    api_base: String,
    token: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(token: &str) -> Self {
        Self::with_api_base("https://api.telegram.org", token)
    }

    /// Point at a different API host (tests, local bot-api servers).
    pub fn with_api_base(api_base: &str, token: &str) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        }
    }
}

/// Request body for Telegram sendMessage
#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Response envelope from the Bot API. On failure `ok` is false and
/// `error_code`/`description` are set.
#[derive(Deserialize)]
struct SendMessageResponse {
    ok: bool,
    result: Option<MessagePayload>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct MessagePayload {
    message_id: i64,
}

fn interpret(status: reqwest::StatusCode, body: &str) -> Result<SendReceipt, NotifyError> {
    let parsed: SendMessageResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(_) => {
            return Err(NotifyError::Transport(format!(
                "unexpected response ({status}): {body}"
            )));
        }
    };

    if !parsed.ok {
        return Err(NotifyError::Rejected {
            code: parsed.error_code.unwrap_or_else(|| status.as_u16() as i64),
            description: parsed
                .description
                .unwrap_or_else(|| "no description".into()),
        });
    }

    Ok(SendReceipt {
        provider_message_id: parsed.result.map(|m| m.message_id.to_string()),
    })
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send(&self, destination: &str, text: &str) -> Result<SendReceipt, NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let body = SendMessageRequest {
            chat_id: destination,
            text,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    NotifyError::Transport(format!("cannot reach {}", self.api_base))
                } else if e.is_timeout() {
                    NotifyError::Transport("request timed out".into())
                } else {
                    NotifyError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        interpret(status, &body)
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_base_is_trimmed() {
        let channel = TelegramChannel::with_api_base("http://localhost:8081/", "tok");
        assert_eq!(channel.api_base, "http://localhost:8081");
    }

    #[test]
    fn request_body_shape() {
        let body = SendMessageRequest {
            chat_id: "4477",
            text: "Hi there",
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"chat_id":"4477","text":"Hi there"}"#);
    }

    #[test]
    fn confirmed_send_yields_message_id() {
        let body = r#"{"ok":true,"result":{"message_id":851,"date":1714650000}}"#;
        let receipt = interpret(reqwest::StatusCode::OK, body).unwrap();
        assert_eq!(receipt.provider_message_id.as_deref(), Some("851"));
    }

    #[test]
    fn provider_rejection_is_surfaced() {
        let body = r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#;
        let err = interpret(reqwest::StatusCode::FORBIDDEN, body).unwrap_err();
        match err {
            NotifyError::Rejected { code, description } => {
                assert_eq!(code, 403);
                assert!(description.contains("blocked"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_a_transport_error() {
        let err = interpret(reqwest::StatusCode::BAD_GATEWAY, "<html>502</html>").unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
    }
}
