//! Long-term per-user summary lifecycle.

use crate::error::ParleyCoreError;
use crate::prompt::{EMPTY_MEMORY_MARKER, render_summary};
use crate::summarize::Summarizer;
use log::{debug, info};
use parley_rs_memory::{ConversationStore, StoreError};
use std::sync::Arc;

/// Result of one summary update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryUpdate {
    /// Stored summary was overwritten with this text.
    Replaced(String),
    /// Summarizer produced nothing usable; the stored summary was left alone.
    Unchanged,
}

/// Reads, rewrites, and erases the single summary kept for each user.
#[derive(Clone)]
pub struct LongTermMemory {
    store: Arc<dyn ConversationStore>,
    summarizer: Arc<dyn Summarizer>,
}

impl LongTermMemory {
    pub fn new(store: Arc<dyn ConversationStore>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { store, summarizer }
    }

    /// Current summary, empty when none is stored.
    pub async fn read(&self, user_id: &str) -> Result<String, StoreError> {
        self.store.get_summary(user_id).await
    }

    /// Drop the user's summary. Succeeds whether or not one existed.
    pub async fn erase(&self, user_id: &str) -> Result<(), StoreError> {
        let existed = self.store.delete_summary(user_id).await?;
        info!(
            "erased long-term memory (user_id={}, existed={})",
            user_id, existed
        );
        Ok(())
    }

    /// Fold `new_message` into the user's summary.
    ///
    /// The summarizer output replaces the stored text wholesale and refreshes
    /// its timestamp, even when the text is identical.
    pub async fn update(
        &self,
        user_id: &str,
        new_message: &str,
    ) -> Result<MemoryUpdate, ParleyCoreError> {
        let current = self.read(user_id).await?;
        let rendered = render_summary(&current);
        let output = self.summarizer.summarize(rendered, new_message).await?;
        let summary = output.trim();
        if summary.is_empty() || summary == EMPTY_MEMORY_MARKER {
            debug!(
                "summarizer produced no summary (user_id={}, had_summary={})",
                user_id,
                !current.trim().is_empty()
            );
            return Ok(MemoryUpdate::Unchanged);
        }
        self.store.upsert_summary(user_id, summary).await?;
        debug!(
            "updated long-term memory (user_id={}, chars={}, changed={})",
            user_id,
            summary.len(),
            summary != current
        );
        Ok(MemoryUpdate::Replaced(summary.to_string()))
    }
}
