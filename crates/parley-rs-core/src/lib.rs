//! Core reply pipeline for Parley.
//!
//! This crate owns short-term context retrieval, the long-term summary
//! lifecycle, prompt assembly, reply generation, and the orchestrator that
//! ties them together for every inbound chat message.

pub mod addressing;
pub mod commands;
pub mod context;
pub mod error;
pub mod llm;
pub mod locks;
pub mod memory;
pub mod orchestrator;
pub mod prompt;
pub mod reply;
pub mod summarize;

pub use addressing::{Addressing, address, classify};
pub use commands::AdminCommand;
pub use context::ShortTermContext;
pub use error::{ModelError, ParleyCoreError};
pub use llm::{ModelClient, ModelSettings};
pub use locks::{KeyedGuard, KeyedLocks};
pub use memory::{LongTermMemory, MemoryUpdate};
/// Orchestrator facade and pipeline results.
pub use orchestrator::{Orchestrator, OrchestratorParts, PipelineOutcome, PipelineStage};
pub use prompt::{DEFAULT_PERSONA, EMPTY_MEMORY_MARKER, PromptBuilder};
pub use reply::{ReplyGenerator, ReplyRequest};
pub use summarize::{LlmSummarizer, Summarizer};
/// Transport types re-exported for adapters.
pub use parley_rs_protocol::{BotIdentity, InboundMessage, ReplySink, SendError};
