//! Telegram notification module
//!
//! One channel serves two roles: fire-and-forget command sends toward the
//! trend bot, and ordered delivery of rendered summary chunks.


use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Outbound text channel (notification channel and delivery callback)
#[async_trait]
pub trait Notify: Send + Sync {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Telegram Bot API notifier
#[derive(Clone)]
pub struct Notifier {
    http: Client,
    bot_token: String,
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct TelegramMessage {
    chat_id: String,
    text: String,
}

impl Notifier {
    pub fn new(bot_token: String) -> Self {
        Self {
            http: Client::new(),
            bot_token,
            enabled: true,
        }
    }

    /// Create a disabled notifier (for when Telegram is not configured)
    pub fn disabled() -> Self {
        Self {
            http: Client::new(),
            bot_token: String::new(),
            enabled: false,
        }
    }
}

#[async_trait]
impl Notify for Notifier {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);

        let msg = TelegramMessage {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
        };

        let response = self.http.post(&url).json(&msg).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Telegram send failed: {}", error_text);
        }

        Ok(())
    }
}
