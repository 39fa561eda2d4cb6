//! Minimal Telegram Bot API client: long polling, HTML messages with
//! inline keyboards, callback acks.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::app::{Result, SitewatchError};

pub const API_BASE: &str = "https://api.telegram.org";

/// Attempts per message when the API keeps answering 429.
const SEND_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<TgUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<Button>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Button {
    pub text: String,
    pub callback_data: String,
}

impl Button {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// How a send attempt ended. `BlockedRecipient` means the chat is gone
/// or has blocked the bot; the caller should drop its subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    BlockedRecipient,
    Failed,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramClient {
    client: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self::with_base(API_BASE, token)
    }

    /// Point the client at an alternative API host. Used by tests.
    pub fn with_base(base: &str, token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(35))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base: format!("{}/bot{}", base.trim_end_matches('/'), token),
        }
    }

    /// Long-poll for updates with ids >= `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let url = format!("{}/getUpdates", self.base);
        let response = self
            .client
            .get(&url)
            .query(&[("offset", offset.to_string()), ("timeout", timeout_secs.to_string())])
            .send()
            .await?
            .error_for_status()?;

        let body: ApiResponse<Vec<Update>> = response.json().await?;
        if !body.ok {
            return Err(SitewatchError::Telegram(
                body.description.unwrap_or_else(|| "getUpdates failed".to_string()),
            ));
        }
        Ok(body.result.unwrap_or_default())
    }

    /// Send an HTML message. Rate limits are retried a few times with
    /// the server-suggested delay; a 400 or 403 marks the recipient as
    /// unreachable rather than erroring.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<SendOutcome> {
        let url = format!("{}/sendMessage", self.base);
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = serde_json::to_value(kb)
                .map_err(|e| SitewatchError::Telegram(format!("bad keyboard: {}", e)))?;
        }

        for attempt in 1..=SEND_ATTEMPTS {
            let response = self.client.post(&url).json(&body).send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if attempt == SEND_ATTEMPTS {
                    return Ok(SendOutcome::Failed);
                }
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                let delay = retry_after.clamp(1, 5);
                tracing::debug!(chat_id, attempt, delay, "rate limited, backing off");
                tokio::time::sleep(Duration::from_secs(delay)).await;
                continue;
            }

            if status == reqwest::StatusCode::BAD_REQUEST
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return Ok(SendOutcome::BlockedRecipient);
            }

            if !status.is_success() {
                tracing::warn!(chat_id, %status, "sendMessage failed");
                return Ok(SendOutcome::Failed);
            }

            return Ok(SendOutcome::Delivered);
        }

        Ok(SendOutcome::Failed)
    }

    /// Acknowledge a callback query, optionally with a toast text.
    pub async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let url = format!("{}/answerCallbackQuery", self.base);
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.client.post(&url).json(&body).send().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_decodes_message() {
        let raw = r#"{
            "update_id": 7,
            "message": {
                "chat": { "id": 42 },
                "from": { "username": "alice" },
                "text": "/start"
            }
        }"#;
        let u: Update = serde_json::from_str(raw).unwrap();
        assert_eq!(u.update_id, 7);
        let m = u.message.unwrap();
        assert_eq!(m.chat.id, 42);
        assert_eq!(m.text.as_deref(), Some("/start"));
        assert!(u.callback_query.is_none());
    }

    #[test]
    fn test_update_decodes_callback() {
        let raw = r#"{
            "update_id": 8,
            "callback_query": {
                "id": "cb1",
                "data": "tog|https://example.com",
                "message": { "chat": { "id": 42 } }
            }
        }"#;
        let u: Update = serde_json::from_str(raw).unwrap();
        let cb = u.callback_query.unwrap();
        assert_eq!(cb.data.as_deref(), Some("tog|https://example.com"));
        assert_eq!(cb.message.unwrap().chat.id, 42);
    }

    #[test]
    fn test_keyboard_serializes() {
        let kb = InlineKeyboard {
            inline_keyboard: vec![vec![Button::new("✅ Site", "tog|u")]],
        };
        let v = serde_json::to_value(&kb).unwrap();
        assert_eq!(v["inline_keyboard"][0][0]["callback_data"], "tog|u");
    }
}
