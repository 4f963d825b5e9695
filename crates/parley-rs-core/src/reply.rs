//! Reply generation for one addressed message.

use crate::context::ShortTermContext;
use crate::error::ParleyCoreError;
use crate::llm::ModelClient;
use crate::memory::LongTermMemory;
use crate::prompt::PromptBuilder;
use log::debug;

/// Inputs for a single reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub channel_id: String,
    pub user_id: String,
    /// Cleaned message text to answer.
    pub user_text: String,
    /// Id of the stored turn for this message, excluded from the history window.
    pub turn_id: Option<i64>,
}

impl ReplyRequest {
    pub fn new(
        channel_id: impl Into<String>,
        user_id: impl Into<String>,
        user_text: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            user_id: user_id.into(),
            user_text: user_text.into(),
            turn_id: None,
        }
    }

    pub fn with_turn_id(mut self, turn_id: i64) -> Self {
        self.turn_id = Some(turn_id);
        self
    }
}

/// Combines short-term history and long-term memory into a model reply.
#[derive(Clone)]
pub struct ReplyGenerator {
    context: ShortTermContext,
    memory: LongTermMemory,
    model: ModelClient,
    prompt: PromptBuilder,
}

impl ReplyGenerator {
    pub fn new(
        context: ShortTermContext,
        memory: LongTermMemory,
        model: ModelClient,
        prompt: PromptBuilder,
    ) -> Self {
        Self {
            context,
            memory,
            model,
            prompt,
        }
    }

    /// Generate reply text. Never returns an empty string.
    pub async fn generate(&self, request: &ReplyRequest) -> Result<String, ParleyCoreError> {
        let limit = self.context.default_limit();
        let history = match request.turn_id {
            Some(turn_id) => {
                self.context
                    .get_context_before(&request.channel_id, limit, turn_id)
                    .await?
            }
            None => self.context.get_context(&request.channel_id, limit).await?,
        };
        let summary = self.memory.read(&request.user_id).await?;
        let messages = self.prompt.build(&summary, &history, &request.user_text);
        debug!(
            "generating reply (channel_id={}, user_id={}, history={}, has_memory={}, \
             temperature={})",
            request.channel_id,
            request.user_id,
            history.len(),
            !summary.trim().is_empty(),
            self.model.settings().temperature
        );
        self.model
            .complete(&messages)
            .await
            .map_err(|err| ParleyCoreError::Generation(err.to_string()))
    }
}
