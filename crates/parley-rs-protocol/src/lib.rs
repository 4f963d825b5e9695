//! Transport-facing types shared between chat adapters and the Parley core.
//!
//! A chat adapter turns platform events into [`InboundMessage`] values and
//! delivers replies through a [`ReplySink`]. Nothing in here knows about a
//! particular chat platform.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A message observed in a channel the assistant can read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundMessage {
    /// Guild (server) the channel belongs to; absent for direct messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Author of the message.
    pub author_id: String,
    /// Raw message text, including any mention or prefix.
    pub text: String,
    /// Whether the author is an automated account.
    #[serde(default)]
    pub is_from_bot: bool,
}

impl InboundMessage {
    /// Message from a human participant.
    pub fn new(
        guild_id: Option<String>,
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            guild_id,
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            text: text.into(),
            is_from_bot: false,
        }
    }

    /// Mark the message as authored by an automated account.
    pub fn from_bot(mut self) -> Self {
        self.is_from_bot = true;
        self
    }
}

/// How the assistant recognizes messages aimed at it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotIdentity {
    /// The assistant's own account id, used for mention tokens.
    pub user_id: String,
    /// Leading marker that addresses the assistant without a mention.
    pub prefix: String,
}

impl BotIdentity {
    pub fn new(user_id: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            prefix: prefix.into(),
        }
    }
}

/// Errors returned when delivering a message to a channel.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The platform refused or failed to deliver the message.
    #[error("send rejected: {0}")]
    Rejected(String),
    /// The transport has shut down.
    #[error("transport closed")]
    Closed,
}

/// Outbound side of a chat transport.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Post plain text to a channel.
    async fn send(&self, channel_id: &str, text: &str) -> Result<(), SendError>;
}

#[cfg(test)]
mod tests {
    use super::InboundMessage;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn inbound_message_defaults_optional_fields() {
        let message: InboundMessage = serde_json::from_value(json!({
            "channel_id": "c1",
            "author_id": "u1",
            "text": "hello"
        }))
        .expect("decode");
        assert_eq!(message, InboundMessage::new(None, "c1", "u1", "hello"));
    }

    #[test]
    fn from_bot_sets_flag() {
        let message = InboundMessage::new(Some("g1".to_string()), "c1", "b1", "beep").from_bot();
        assert!(message.is_from_bot);
        let value = serde_json::to_value(&message).expect("encode");
        assert_eq!(value["guild_id"], "g1");
        assert_eq!(value["is_from_bot"], true);
    }
}
