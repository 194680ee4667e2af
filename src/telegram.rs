use reqwest::Url;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::BotError;

/// Delivers text messages to the configured chat.
pub trait Notifier {
    /// # Errors
    /// Returns [`BotError::Telegram`] if the message could not be delivered.
    fn notify(&self, text: &str) -> Result<(), BotError>;
}

#[derive(Debug, Clone)]
pub struct TelegramClient {
    http_client: Client,
    url: Url,
    chat_id: String,
}

#[derive(Debug, Clone, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    description: Option<String>,
}

const API_BASE: &str = "https://api.telegram.org/";

impl TelegramClient {
    /// # Errors
    /// Fails if the bot token cannot form a valid URL.
    pub fn new(http_client: Client, token: &str, chat_id: String) -> Result<Self, BotError> {
        let url = Url::parse(&format!("{API_BASE}bot{token}/sendMessage"))
            .map_err(|e| BotError::Telegram(format!("invalid bot token: {e}")))?;
        Ok(Self::with_url(http_client, url, chat_id))
    }

    /// Uses `url` as the full `sendMessage` endpoint, e.g. for a local Bot API server.
    #[must_use]
    pub const fn with_url(http_client: Client, url: Url, chat_id: String) -> Self {
        Self {
            http_client,
            url,
            chat_id,
        }
    }

    fn send(&self, text: &str) -> Result<(), BotError> {
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
        };
        // The URL contains the bot token, so the transport error is stripped of it.
        let resp = self
            .http_client
            .post(self.url.clone())
            .json(&body)
            .send()
            .map_err(|e| BotError::Telegram(e.without_url().to_string()))?;

        let status = resp.status();
        let reply: Option<ApiReply> = resp.json().ok();
        check_reply(status.is_success(), status.as_u16(), reply)
    }
}

fn check_reply(success: bool, status: u16, reply: Option<ApiReply>) -> Result<(), BotError> {
    match reply {
        Some(ApiReply { ok: true, .. }) if success => Ok(()),
        Some(ApiReply {
            description: Some(desc),
            ..
        }) => Err(BotError::Telegram(desc)),
        _ => Err(BotError::Telegram(format!("status {status}"))),
    }
}

impl Notifier for TelegramClient {
    fn notify(&self, text: &str) -> Result<(), BotError> {
        log::debug!("Sending message: {text}");
        self.send(text)?;
        log::info!("Sent message: {text}");
        Ok(())
    }
}
