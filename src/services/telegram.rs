use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Coordinates, InboundEvent, OutboundMessage};

/// Maximum message length accepted by Telegram's sendMessage
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Errors that can occur when talking to the Telegram Bot API
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),
}

/// Subset of a Telegram `Update` the bot reacts to
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Update {
    /// Translate the update into a chat id and core event
    ///
    /// Returns `None` for updates the bot ignores (edits, stickers, unknown commands).
    pub fn into_event(self) -> Option<(i64, InboundEvent)> {
        let message = self.message?;
        let chat_id = message.chat.id;
        // Private chats share the user's id; fall back to the chat for channel posts
        let user_id = message.from.map(|u| u.id).unwrap_or(chat_id);

        if let Some(location) = message.location {
            return Some((
                chat_id,
                InboundEvent::LocationShared {
                    user_id,
                    location: Coordinates::new(location.latitude, location.longitude),
                },
            ));
        }

        let text = message.text?;
        let event = match parse_command(&text) {
            Some("start") => InboundEvent::StartRequested { user_id },
            Some("register") => InboundEvent::RegisterRequested { user_id },
            Some("find_matches") => InboundEvent::FindMatchesRequested { user_id },
            Some("share_location") => InboundEvent::ShareLocationRequested { user_id },
            Some(other) => {
                tracing::debug!(user_id, command = other, "Ignoring unknown command");
                return None;
            }
            None => InboundEvent::TextReceived { user_id, text },
        };

        Some((chat_id, event))
    }
}

/// Extract the command name from `/cmd@botname args`
fn parse_command(text: &str) -> Option<&str> {
    let word = text.trim().strip_prefix('/')?.split_whitespace().next()?;
    Some(word.split('@').next().unwrap_or(word))
}

/// Telegram Bot API client used to deliver replies
pub struct TelegramClient {
    base_url: String,
    bot_token: String,
    client: Client,
}

impl TelegramClient {
    /// Create a new client
    pub fn new(base_url: String, bot_token: String) -> Result<Self, TelegramError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url,
            bot_token,
            client,
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bot_token,
            method
        )
    }

    /// Deliver every reply to the chat, in order
    pub async fn deliver(
        &self,
        chat_id: i64,
        messages: &[OutboundMessage],
    ) -> Result<(), TelegramError> {
        for message in messages {
            self.send_message(chat_id, &message.text(), message.requests_location())
                .await?;
        }
        Ok(())
    }

    /// Send a text message, attaching a one-time "Share Location" keyboard when asked
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        request_location: bool,
    ) -> Result<(), TelegramError> {
        let text: String = text.chars().take(TELEGRAM_MAX_MESSAGE_LENGTH).collect();

        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if request_location {
            body["reply_markup"] = json!({
                "keyboard": [[{ "text": "Share Location", "request_location": true }]],
                "one_time_keyboard": true,
                "resize_keyboard": true,
            });
        }

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err = response.text().await.unwrap_or_default();
            return Err(TelegramError::ApiError(format!(
                "sendMessage failed ({}): {}",
                status, err
            )));
        }

        tracing::debug!(chat_id, "Telegram message sent");
        Ok(())
    }
}
