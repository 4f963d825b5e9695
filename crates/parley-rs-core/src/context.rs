//! Short-term conversational window for a channel.

use log::debug;
use parley_rs_memory::{ContextMessage, ConversationStore, StoreError};
use std::sync::Arc;

/// Reads the most recent turns of a channel in causal order.
#[derive(Clone)]
pub struct ShortTermContext {
    store: Arc<dyn ConversationStore>,
    default_limit: usize,
}

impl ShortTermContext {
    pub fn new(store: Arc<dyn ConversationStore>, default_limit: usize) -> Self {
        Self {
            store,
            default_limit,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Up to `limit` most recent turns, oldest first.
    pub async fn get_context(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<ContextMessage>, StoreError> {
        let mut turns = self.store.recent_turns(channel_id, limit).await?;
        turns.reverse();
        debug!(
            "loaded short-term context (channel_id={}, turns={}, limit={})",
            channel_id,
            turns.len(),
            limit
        );
        Ok(turns.into_iter().map(ContextMessage::from).collect())
    }

    /// Context window using the configured default size.
    pub async fn get_default_context(
        &self,
        channel_id: &str,
    ) -> Result<Vec<ContextMessage>, StoreError> {
        self.get_context(channel_id, self.default_limit).await
    }

    /// Up to `limit` turns preceding `turn_id`, oldest first.
    ///
    /// Used when the message being answered has already been recorded and will
    /// be appended to the prompt separately.
    pub async fn get_context_before(
        &self,
        channel_id: &str,
        limit: usize,
        turn_id: i64,
    ) -> Result<Vec<ContextMessage>, StoreError> {
        let mut turns = self.store.turns_before(channel_id, turn_id, limit).await?;
        turns.reverse();
        debug!(
            "loaded short-term context (channel_id={}, turns={}, before_id={})",
            channel_id,
            turns.len(),
            turn_id
        );
        Ok(turns.into_iter().map(ContextMessage::from).collect())
    }
}
