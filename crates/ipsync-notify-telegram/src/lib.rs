// # Telegram Notifier
//
// Sends ipsync change notifications through the Telegram bot API.
//
// ## Behavior
//
// - One `sendMessage` call per configured chat
// - Every chat is attempted, even after an earlier failure
// - No retry: a lost notification is logged by the engine and forgotten
//
// ## Security Requirements
//
// The bot token is part of the request path. It never appears in logs,
// errors or Debug output; transport errors are stripped of their URL.
//
// ## API Reference
//
// - Bot API: https://core.telegram.org/bots/api#sendmessage
// - POST `/bot<token>/sendMessage` with `{"chat_id": ..., "text": ...}`

use async_trait::async_trait;
use ipsync_core::config::{ChatId, TelegramConfig};
use ipsync_core::traits::Notifier;
use ipsync_core::{Error, Result};
use serde::Serialize;
use std::time::Duration;

/// Telegram Bot API base URL
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest error body carried into error messages
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a ChatId,
    text: &'a str,
}

/// Telegram bot notifier
pub struct TelegramNotifier {
    /// Bot token
    /// ⚠️ NEVER log this value
    bot_token: String,

    /// Target chats
    chat_ids: Vec<ChatId>,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("bot_token", &"<REDACTED>")
            .field("chat_ids", &self.chat_ids)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TelegramNotifier {
    /// Create a new notifier
    ///
    /// # Parameters
    ///
    /// - `bot_token`: Token issued by @BotFather
    /// - `chat_ids`: Chats receiving every message (at least one)
    /// - `timeout`: Per-request timeout
    pub fn new(
        bot_token: impl Into<String>,
        chat_ids: Vec<ChatId>,
        timeout: Duration,
    ) -> Result<Self> {
        let bot_token = bot_token.into();

        if bot_token.trim().is_empty() {
            return Err(Error::config("Telegram bot token cannot be empty"));
        }

        if chat_ids.is_empty() {
            return Err(Error::config("at least one Telegram chat id is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            bot_token,
            chat_ids,
            base_url: TELEGRAM_API_BASE.to_string(),
            client,
        })
    }

    /// Create a notifier from resolved configuration
    pub fn from_config(config: &TelegramConfig, timeout: Duration) -> Result<Self> {
        Self::new(config.bot_token.clone(), config.chat_ids.clone(), timeout)
    }

    /// Create a notifier with the default timeout
    pub fn with_defaults(bot_token: impl Into<String>, chat_ids: Vec<ChatId>) -> Result<Self> {
        Self::new(bot_token, chat_ids, DEFAULT_HTTP_TIMEOUT)
    }

    /// Point the notifier at another API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Target chats
    pub fn chat_ids(&self) -> &[ChatId] {
        &self.chat_ids
    }

    async fn send_to(&self, chat_id: &ChatId, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);

        let response = self
            .client
            .post(&url)
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .map_err(|e| Error::notify(format!("HTTP request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = read_error_body(response).await;
            return Err(Error::notify(format!("{} - {}", status, error_text)));
        }

        Ok(())
    }
}

/// Read at most [`MAX_ERROR_BODY`] bytes of an error response
async fn read_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = MAX_ERROR_BODY - body.len();
                if chunk.len() > room {
                    body.extend_from_slice(&chunk[..room]);
                    return format!("{} [truncated]", String::from_utf8_lossy(&body));
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(_) if body.is_empty() => return "Unable to read error response".to_string(),
            Err(_) => break,
        }
    }

    String::from_utf8_lossy(&body).into_owned()
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let mut failures = Vec::new();

        for chat_id in &self.chat_ids {
            match self.send_to(chat_id, message).await {
                Ok(()) => tracing::info!("Telegram message sent to chat {}", chat_id),
                Err(e) => {
                    tracing::error!("Telegram message to chat {} failed: {}", chat_id, e);
                    failures.push(format!("chat {}: {}", chat_id, e));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::notify(format!(
                "{} of {} chats failed ({})",
                failures.len(),
                self.chat_ids.len(),
                failures.join("; ")
            )))
        }
    }

    fn notifier_name(&self) -> &'static str {
        "telegram"
    }
}
