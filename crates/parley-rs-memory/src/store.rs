//! Store abstraction shared by the context and memory components.

use crate::error::StoreError;
use crate::model::{NewTurn, Turn, UserMemory};
use async_trait::async_trait;

/// Durable storage for channel transcripts and per-user summaries.
///
/// Every operation is a single atomic write or read; nothing is partially
/// visible after a failure.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persist a turn and return it with its assigned id.
    async fn append_turn(&self, turn: NewTurn) -> Result<Turn, StoreError>;

    /// Up to `limit` most recent turns for a channel, newest first.
    async fn recent_turns(&self, channel_id: &str, limit: usize)
    -> Result<Vec<Turn>, StoreError>;

    /// Up to `limit` turns with an id below `before_id`, newest first.
    async fn turns_before(
        &self,
        channel_id: &str,
        before_id: i64,
        limit: usize,
    ) -> Result<Vec<Turn>, StoreError>;

    /// Number of stored turns for a channel.
    async fn count_turns(&self, channel_id: &str) -> Result<usize, StoreError>;

    /// Remove every turn for a channel, returning how many were deleted.
    async fn delete_turns(&self, channel_id: &str) -> Result<usize, StoreError>;

    /// Full summary record for a user, if one exists.
    async fn get_user_memory(&self, user_id: &str) -> Result<Option<UserMemory>, StoreError>;

    /// Stored summary for a user, or an empty string when absent.
    async fn get_summary(&self, user_id: &str) -> Result<String, StoreError> {
        Ok(self
            .get_user_memory(user_id)
            .await?
            .map(|memory| memory.summary)
            .unwrap_or_default())
    }

    /// Insert or overwrite the summary for a user and refresh its timestamp.
    async fn upsert_summary(&self, user_id: &str, summary: &str) -> Result<(), StoreError>;

    /// Remove the summary for a user, returning whether a record existed.
    async fn delete_summary(&self, user_id: &str) -> Result<bool, StoreError>;
}
