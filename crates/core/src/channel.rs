//! Channel trait — the abstraction over messaging platforms.
//!
//! A Channel connects the relay to a messaging platform (Twilio SMS, Slack).
//! Inbound messages arrive through the gateway's webhook routes and are
//! normalized into [`ChannelMessage`]; replies go back out through
//! [`Channel::send`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ChannelError;

/// Unique identifier for a channel instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message received from a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// The channel this message belongs to
    pub channel_id: ChannelId,

    /// Sender identifier (phone number, Slack user id)
    pub sender_id: String,

    /// The text content
    pub content: String,

    /// Where the reply goes (phone number, Slack channel id)
    pub chat_id: String,

    /// Platform-specific metadata
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// The core Channel trait.
///
/// Implementations handle platform-specific message formatting and outbound
/// delivery. Delivery is fire-and-log: callers log failures, nothing retries.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "sms", "slack").
    fn name(&self) -> &str;

    /// Whether the outbound credentials are present.
    fn is_configured(&self) -> bool;

    /// Send a message to a specific chat.
    async fn send(&self, chat_id: &str, content: &str) -> std::result::Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_message_creation() {
        let msg = ChannelMessage {
            channel_id: ChannelId("sms".into()),
            sender_id: "+15551234567".into(),
            content: "Hello bot!".into(),
            chat_id: "+15551234567".into(),
            metadata: serde_json::Map::new(),
        };
        assert_eq!(msg.channel_id.to_string(), "sms");
        assert_eq!(msg.content, "Hello bot!");
    }

    #[test]
    fn empty_metadata_is_skipped() {
        let msg = ChannelMessage {
            channel_id: ChannelId("slack".into()),
            sender_id: "U1".into(),
            content: "hi".into(),
            chat_id: "C1".into(),
            metadata: serde_json::Map::new(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("metadata"));
    }
}
