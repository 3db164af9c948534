//! Telegram Bot API notifier.
//!
//! Delivers HTML messages via the `sendMessage` endpoint and hands back the
//! message id so later messages can reply to it.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{ServiceNotificationsConfig, TelegramConfig};
use crate::core::{InventoryRecord, MessageRef, Notifier, NotifyError, OperatorChannel, UserId};

/// Default Bot API root.
pub const TELEGRAM_API: &str = "https://api.telegram.org";

/// Retry hint used when a 429 response carries none.
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Sends messages to users via the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Create a notifier from bot credentials.
    pub fn from_config(cfg: &TelegramConfig) -> Result<Self, NotifyError> {
        cfg.validate().map_err(NotifyError::Config)?;
        Ok(Self::with_token(cfg.bot_token.clone()))
    }

    fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            api_base: TELEGRAM_API.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the notifier at another Bot API server.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    async fn send_message(&self, chat_id: Value, text: &str) -> Result<MessageRef, NotifyError> {
        let body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(self.send_message_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        let status = response.status().as_u16();
        let reply: Value = response
            .json()
            .await
            .map_err(|e| NotifyError::Delivery(format!("unreadable Telegram reply: {e}")))?;

        parse_send_response(status, &reply)
    }
}

/// Interpret a `sendMessage` reply.
pub fn parse_send_response(status: u16, body: &Value) -> Result<MessageRef, NotifyError> {
    if body.get("ok") == Some(&Value::Bool(true)) {
        return body
            .pointer("/result/message_id")
            .and_then(Value::as_i64)
            .map(MessageRef)
            .ok_or_else(|| NotifyError::Delivery("response missing result.message_id".into()));
    }

    if status == 429 {
        let retry_after_secs = body
            .pointer("/parameters/retry_after")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(NotifyError::RateLimited { retry_after_secs });
    }

    let description = body
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("unknown Telegram API error");
    Err(NotifyError::Delivery(format!("Telegram API error {status}: {description}")))
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, user_id: UserId, text: &str, _matches: &[InventoryRecord]) -> Result<MessageRef, NotifyError> {
        let message = self.send_message(json!(user_id), text).await?;
        tracing::debug!(user_id, message_id = message.0, "Telegram message sent");
        Ok(message)
    }
}

/// Operator chat reached through a service bot.
#[derive(Debug, Clone)]
pub struct TelegramServiceChat {
    bot: TelegramNotifier,
    chat_id: String,
}

impl TelegramServiceChat {
    /// Create the channel from service chat settings.
    pub fn from_config(cfg: &ServiceNotificationsConfig) -> Result<Self, NotifyError> {
        cfg.validate().map_err(NotifyError::Config)?;
        Ok(Self {
            bot: TelegramNotifier::with_token(cfg.bot_token.clone()),
            chat_id: cfg.chat_id.clone(),
        })
    }

    /// Point the channel at another Bot API server.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.bot = self.bot.with_api_base(api_base);
        self
    }
}

#[async_trait]
impl OperatorChannel for TelegramServiceChat {
    async fn alert(&self, text: &str) -> Result<(), NotifyError> {
        self.bot.send_message(json!(self.chat_id), text).await.map(|_| ())
    }
}
