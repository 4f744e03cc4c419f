//! Telegram Bot API delivery.
//!
//! API: `https://api.telegram.org/bot{token}/sendMessage`
//! Messages are sent with `parse_mode=Markdown` (legacy Markdown).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use tracing::{error, info};

use super::Notifier;

const API_BASE: &str = "https://api.telegram.org";

/// Hard limit on message length imposed by Telegram.
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

pub struct TelegramNotifier {
    http: Client,
    bot_token: Secret<String>,
    chat_id: String,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: Secret<String>, chat_id: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("TIPSTER/0.1.0")
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(Self {
            http,
            bot_token,
            chat_id,
            api_base: API_BASE.to_string(),
        })
    }

    /// Point the client at another Bot API server (self-hosted or test).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token.expose_secret())
    }
}

/// Cut a message to Telegram's length limit on a char boundary.
pub fn truncate_message(text: &str) -> &str {
    match text.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: truncate_message(text),
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        let resp = self
            .http
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .context("Telegram request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            error!(status = %status, detail = %detail, "Telegram rejected message");
            anyhow::bail!("Telegram API error {status}: {detail}");
        }

        info!(chat_id = %self.chat_id, "Message sent to Telegram");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
