use async_trait::async_trait;
use parley_rs_memory::{
    ConversationStore, NewTurn, Role, SqliteStore, StoreError, Turn, UserMemory,
};

/// In-memory SQLite store that can be told to refuse some writes.
#[derive(Debug, Clone)]
pub struct FaultyStore {
    inner: SqliteStore,
    failing_role: Option<Role>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().expect("in-memory store"),
            failing_role: None,
        }
    }

    /// Reject every appended turn with this role.
    pub fn fail_appends_for(mut self, role: Role) -> Self {
        self.failing_role = Some(role);
        self
    }
}

impl Default for FaultyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for FaultyStore {
    async fn append_turn(&self, turn: NewTurn) -> Result<Turn, StoreError> {
        if self.failing_role == Some(turn.role) {
            return Err(StoreError::Closed);
        }
        self.inner.append_turn(turn).await
    }

    async fn recent_turns(&self, channel_id: &str, limit: usize) -> Result<Vec<Turn>, StoreError> {
        self.inner.recent_turns(channel_id, limit).await
    }

    async fn turns_before(
        &self,
        channel_id: &str,
        before_id: i64,
        limit: usize,
    ) -> Result<Vec<Turn>, StoreError> {
        self.inner.turns_before(channel_id, before_id, limit).await
    }

    async fn count_turns(&self, channel_id: &str) -> Result<usize, StoreError> {
        self.inner.count_turns(channel_id).await
    }

    async fn delete_turns(&self, channel_id: &str) -> Result<usize, StoreError> {
        self.inner.delete_turns(channel_id).await
    }

    async fn get_user_memory(&self, user_id: &str) -> Result<Option<UserMemory>, StoreError> {
        self.inner.get_user_memory(user_id).await
    }

    async fn upsert_summary(&self, user_id: &str, summary: &str) -> Result<(), StoreError> {
        self.inner.upsert_summary(user_id, summary).await
    }

    async fn delete_summary(&self, user_id: &str) -> Result<bool, StoreError> {
        self.inner.delete_summary(user_id).await
    }
}
