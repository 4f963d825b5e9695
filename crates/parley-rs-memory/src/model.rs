//! Record models owned by the conversation store.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Author role of a recorded turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message written by a chat participant.
    User,
    /// Reply produced by the assistant.
    Assistant,
}

impl Role {
    /// Storage representation of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(StoreError::InvalidRole(other.to_string())),
        }
    }
}

/// Persisted turn record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// Store-assigned identity, increasing with insertion order.
    pub id: i64,
    /// Guild the channel belongs to, absent for direct messages.
    pub guild_id: Option<String>,
    /// Channel the turn was posted in.
    pub channel_id: String,
    /// Author of the turn (the bot's own id for assistant turns).
    pub author_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Turn awaiting insertion; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTurn {
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub author_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewTurn {
    /// Build a user turn stamped with the current time.
    pub fn user(
        guild_id: Option<String>,
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::with_role(Role::User, guild_id, channel_id, author_id, content)
    }

    /// Build an assistant turn stamped with the current time.
    pub fn assistant(
        guild_id: Option<String>,
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::with_role(Role::Assistant, guild_id, channel_id, author_id, content)
    }

    fn with_role(
        role: Role,
        guild_id: Option<String>,
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            guild_id,
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Long-term summary held for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserMemory {
    pub user_id: String,
    /// Single-statement summary; may be empty.
    pub summary: String,
    pub updated_at: DateTime<Utc>,
}

/// Role/content pair handed to prompt assembly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextMessage {
    pub role: Role,
    pub content: String,
}

impl From<Turn> for ContextMessage {
    fn from(turn: Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NewTurn, Role};
    use crate::StoreError;
    use pretty_assertions::assert_eq;

    #[test]
    fn role_parses_only_known_values() {
        assert_eq!("user".parse::<Role>().expect("user"), Role::User);
        assert_eq!(
            "assistant".parse::<Role>().expect("assistant"),
            Role::Assistant
        );
        let err = "system".parse::<Role>().unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidRole(role) if role == "system"
        ));
    }

    #[test]
    fn new_turn_constructors_set_role() {
        let user = NewTurn::user(None, "c1", "u1", "hi");
        let assistant = NewTurn::assistant(Some("g1".to_string()), "c1", "bot", "hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.guild_id.as_deref(), Some("g1"));
    }
}
