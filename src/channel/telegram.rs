//! Telegram Bot API channel (`sendMessage` / `sendPhoto`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Channel;
use crate::config::TELEGRAM_API_URL;
use crate::{Error, Result};

const PARSE_MODE: &str = "HTML";

#[derive(Debug, Clone)]
pub struct TelegramChannel {
    http: Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        http: Client,
        bot_token: S1,
        chat_id: S2,
    ) -> Result<Self> {
        let bot_token = bot_token.into();
        if bot_token.trim().is_empty() {
            return Err(Error::InvalidArgument("bot token is empty".to_string()));
        }

        Ok(Self {
            http,
            base_url: TELEGRAM_API_URL.to_string(),
            bot_token,
            chat_id: chat_id.into(),
        })
    }

    /// Point the client at another Bot API server (self-hosted or tests).
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    async fn call<P: Serialize + Sync>(&self, method: &str, payload: &P) -> Result<()> {
        let url = format!("{}/bot{}/{}", self.base_url, self.bot_token, method);

        // The URL embeds the bot token; keep it out of error messages.
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                Error::DeliveryFailed(format!("{} request failed: {}", method, e.without_url()))
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| {
                Error::DeliveryFailed(format!(
                    "failed to read {} response: {}",
                    method,
                    e.without_url()
                ))
            })?;

        let reply: BotResponse = serde_json::from_str(&text).map_err(|_| {
            Error::DeliveryFailed(format!("{} returned HTTP {}: {}", method, status.as_u16(), text))
        })?;

        if !status.is_success() || !reply.ok {
            return Err(Error::DeliveryFailed(format!(
                "{} returned HTTP {}: {}",
                method,
                status.as_u16(),
                reply.description.unwrap_or(text)
            )));
        }

        debug!(method, chat_id = %self.chat_id, "Telegram accepted message");
        Ok(())
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    async fn send_text(&self, text: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: PARSE_MODE,
        };
        self.call("sendMessage", &payload).await
    }

    async fn send_photo(&self, photo: &str, caption: &str) -> Result<()> {
        let payload = SendPhoto {
            chat_id: &self.chat_id,
            photo,
            caption,
            parse_mode: PARSE_MODE,
        };
        self.call("sendPhoto", &payload).await
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Serialize)]
struct SendPhoto<'a> {
    chat_id: &'a str,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    ok: bool,
    description: Option<String>,
}
