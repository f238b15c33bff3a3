use serde::{Deserialize, Serialize};

use crate::models::messages::OutboundMessage;

/// One reply rendered for the HTTP event API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub kind: String,
    pub text: String,
    #[serde(rename = "requestLocation")]
    pub request_location: bool,
}

impl From<&OutboundMessage> for RenderedMessage {
    fn from(message: &OutboundMessage) -> Self {
        Self {
            kind: message.kind().to_string(),
            text: message.text(),
            request_location: message.requests_location(),
        }
    }
}

/// Response for the event endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    pub messages: Vec<RenderedMessage>,
}

impl EventResponse {
    pub fn from_messages(messages: &[OutboundMessage]) -> Self {
        Self {
            messages: messages.iter().map(RenderedMessage::from).collect(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
