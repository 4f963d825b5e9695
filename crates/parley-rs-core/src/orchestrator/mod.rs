//! Conversation orchestrator: the per-message reply pipeline.

mod background;
mod outcome;

pub use outcome::{PipelineOutcome, PipelineStage};

use crate::addressing::{Addressing, classify};
use crate::context::ShortTermContext;
use crate::error::ParleyCoreError;
use crate::llm::{ModelClient, ModelSettings};
use crate::locks::KeyedLocks;
use crate::memory::LongTermMemory;
use crate::prompt::PromptBuilder;
use crate::reply::{ReplyGenerator, ReplyRequest};
use crate::summarize::Summarizer;
use autoagents_llm::LLMProvider;
use background::{BackgroundTasks, update_memory};
use log::{debug, error, info, warn};
use parley_rs_config::{MemoryUpdateMode, ParleyConfig};
use parley_rs_memory::{ConversationStore, NewTurn};
use parley_rs_protocol::{BotIdentity, InboundMessage, ReplySink};
use std::sync::Arc;

/// Collaborators the orchestrator is assembled from.
pub struct OrchestratorParts {
    pub config: ParleyConfig,
    pub store: Arc<dyn ConversationStore>,
    /// Provider used for replies, built with the reply temperature.
    pub reply_llm: Arc<dyn LLMProvider>,
    pub summarizer: Arc<dyn Summarizer>,
    pub sink: Arc<dyn ReplySink>,
    /// The assistant's own account id on the chat platform.
    pub bot_user_id: String,
}

/// Handles inbound messages: records history, replies when addressed, and
/// keeps each author's long-term summary current.
pub struct Orchestrator {
    config: Arc<ParleyConfig>,
    store: Arc<dyn ConversationStore>,
    memory: LongTermMemory,
    replies: ReplyGenerator,
    sink: Arc<dyn ReplySink>,
    identity: BotIdentity,
    channel_locks: KeyedLocks,
    user_locks: KeyedLocks,
    background: BackgroundTasks,
}

impl Orchestrator {
    pub fn new(parts: OrchestratorParts) -> Result<Self, ParleyCoreError> {
        let OrchestratorParts {
            config,
            store,
            reply_llm,
            summarizer,
            sink,
            bot_user_id,
        } = parts;
        if bot_user_id.trim().is_empty() {
            return Err(ParleyCoreError::Config(
                "bot user id must not be empty".to_string(),
            ));
        }
        if config.assistant.prefix.trim().is_empty() {
            return Err(ParleyCoreError::Config(
                "assistant.prefix must not be empty".to_string(),
            ));
        }
        if config.memory.context_turns == 0 {
            return Err(ParleyCoreError::Config(
                "memory.context_turns must be at least 1".to_string(),
            ));
        }

        let memory = LongTermMemory::new(store.clone(), summarizer);
        let replies = ReplyGenerator::new(
            ShortTermContext::new(store.clone(), config.memory.context_turns),
            memory.clone(),
            ModelClient::new(reply_llm, ModelSettings::for_replies(&config.model)),
            PromptBuilder::from_config(&config.assistant),
        );
        let (channel_locks, user_locks) = if config.concurrency.serialize_per_channel {
            (KeyedLocks::new(), KeyedLocks::new())
        } else {
            (KeyedLocks::disabled(), KeyedLocks::disabled())
        };
        let identity = BotIdentity::new(bot_user_id, config.assistant.prefix.clone());
        info!(
            "orchestrator ready (bot_user_id={}, context_turns={}, update_mode={:?}, \
             serialized={})",
            identity.user_id,
            config.memory.context_turns,
            config.memory.update_mode,
            channel_locks.is_enabled()
        );
        Ok(Self {
            config: Arc::new(config),
            store,
            memory,
            replies,
            sink,
            identity,
            channel_locks,
            user_locks,
            background: BackgroundTasks::default(),
        })
    }

    /// Run the pipeline for one inbound message.
    ///
    /// Returns `Err` only when the user turn itself could not be recorded;
    /// later failures are reported as [`PipelineOutcome::Failed`].
    pub async fn handle_message(
        &self,
        message: InboundMessage,
    ) -> Result<PipelineOutcome, ParleyCoreError> {
        if message.is_from_bot {
            debug!(
                "ignoring bot-authored message (channel_id={}, author_id={})",
                message.channel_id, message.author_id
            );
            return Ok(PipelineOutcome::IgnoredBot);
        }
        if message.text.trim().is_empty() {
            return Ok(PipelineOutcome::IgnoredEmpty);
        }

        let addressing = classify(&message.text, &self.identity);
        let channel_guard = self.channel_locks.lock(&message.channel_id).await;

        let user_turn = NewTurn::user(
            message.guild_id.clone(),
            message.channel_id.as_str(),
            message.author_id.as_str(),
            message.text.as_str(),
        );
        let user_turn = match self.store.append_turn(user_turn).await {
            Ok(turn) => turn,
            Err(err) => {
                error!(
                    "message pipeline failed (channel_id={}, author_id={}, stage={}, error={})",
                    message.channel_id,
                    message.author_id,
                    PipelineStage::PersistUserTurn,
                    err
                );
                if matches!(addressing, Addressing::Addressed(_)) {
                    self.send_apology(&message.channel_id).await;
                }
                return Err(err.into());
            }
        };

        let user_text = match addressing {
            Addressing::Unaddressed => {
                debug!(
                    "recorded unaddressed message (channel_id={}, turn_id={})",
                    message.channel_id, user_turn.id
                );
                return Ok(PipelineOutcome::Persisted);
            }
            Addressing::Empty => {
                debug!(
                    "addressed message empty after stripping (channel_id={}, turn_id={})",
                    message.channel_id, user_turn.id
                );
                return Ok(PipelineOutcome::EmptyAfterStrip);
            }
            Addressing::Addressed(text) => text,
        };

        let request = ReplyRequest::new(
            message.channel_id.as_str(),
            message.author_id.as_str(),
            user_text,
        )
        .with_turn_id(user_turn.id);
        let reply = match self.replies.generate(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                return Ok(self
                    .fail(&message.channel_id, PipelineStage::GenerateReply, err)
                    .await);
            }
        };

        if let Err(err) = self.sink.send(&message.channel_id, &reply).await {
            return Ok(self
                .fail(&message.channel_id, PipelineStage::SendReply, err.into())
                .await);
        }

        let assistant_turn = NewTurn::assistant(
            message.guild_id.clone(),
            message.channel_id.as_str(),
            self.identity.user_id.as_str(),
            reply.as_str(),
        );
        // A reply without its stored turn skips the memory update too.
        if let Err(err) = self.store.append_turn(assistant_turn).await {
            return Ok(self
                .fail(
                    &message.channel_id,
                    PipelineStage::PersistAssistantTurn,
                    err.into(),
                )
                .await);
        }
        drop(channel_guard);

        info!(
            "replied to message (channel_id={}, author_id={}, turn_id={}, reply_chars={})",
            message.channel_id,
            message.author_id,
            user_turn.id,
            reply.len()
        );
        self.schedule_memory_update(message.author_id, message.text)
            .await;
        Ok(PipelineOutcome::Replied { reply })
    }

    /// Current summary for a user, empty when none is stored.
    pub async fn read_memory(&self, user_id: &str) -> Result<String, ParleyCoreError> {
        Ok(self.memory.read(user_id).await?)
    }

    /// Erase a user's summary once any in-flight update for them has finished.
    pub async fn forget_user(&self, user_id: &str) -> Result<(), ParleyCoreError> {
        let _guard = self.user_locks.lock(user_id).await;
        Ok(self.memory.erase(user_id).await?)
    }

    /// Delete a channel's history, returning how many turns were removed.
    pub async fn reset_channel(&self, channel_id: &str) -> Result<usize, ParleyCoreError> {
        let _guard = self.channel_locks.lock(channel_id).await;
        Ok(self.store.delete_turns(channel_id).await?)
    }

    /// Memory updates spawned but not yet awaited.
    pub fn pending_memory_updates(&self) -> usize {
        self.background.pending()
    }

    /// Wait for in-flight memory updates to finish.
    pub async fn shutdown(&self) {
        let drained = self.background.drain().await;
        info!("orchestrator shut down (memory_updates_awaited={})", drained);
    }

    async fn schedule_memory_update(&self, user_id: String, text: String) {
        match self.config.memory.update_mode {
            MemoryUpdateMode::Inline => {
                update_memory(self.memory.clone(), self.user_locks.clone(), user_id, text).await;
            }
            MemoryUpdateMode::Background => {
                self.background
                    .spawn(self.memory.clone(), self.user_locks.clone(), user_id, text);
            }
        }
    }

    /// Log a failed stage and apologize in the channel.
    async fn fail(
        &self,
        channel_id: &str,
        stage: PipelineStage,
        err: ParleyCoreError,
    ) -> PipelineOutcome {
        error!(
            "message pipeline failed (channel_id={}, stage={}, error={})",
            channel_id, stage, err
        );
        self.send_apology(channel_id).await;
        PipelineOutcome::Failed {
            stage,
            reason: err.to_string(),
        }
    }

    async fn send_apology(&self, channel_id: &str) {
        if let Err(err) = self.sink.send(channel_id, &self.config.assistant.apology).await {
            warn!(
                "failed to send apology (channel_id={}, error={})",
                channel_id, err
            );
        }
    }
}
