//! Pipeline stages and per-message outcomes.

use std::fmt;

/// Steps of the per-message pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    PersistUserTurn,
    GenerateReply,
    SendReply,
    PersistAssistantTurn,
    UpdateMemory,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::PersistUserTurn => "persist_user_turn",
            PipelineStage::GenerateReply => "generate_reply",
            PipelineStage::SendReply => "send_reply",
            PipelineStage::PersistAssistantTurn => "persist_assistant_turn",
            PipelineStage::UpdateMemory => "update_memory",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the pipeline finished for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Authored by an automated account; nothing recorded.
    IgnoredBot,
    /// Blank text; nothing recorded.
    IgnoredEmpty,
    /// Recorded as history; not addressed to the assistant.
    Persisted,
    /// Addressed, but empty once the prefix and mentions were removed.
    EmptyAfterStrip,
    /// Reply delivered and recorded. The memory update may still be running.
    Replied { reply: String },
    /// A stage after the user turn failed; the error has been logged.
    Failed {
        stage: PipelineStage,
        reason: String,
    },
}

impl PipelineOutcome {
    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineOutcome::IgnoredBot => "ignored_bot",
            PipelineOutcome::IgnoredEmpty => "ignored_empty",
            PipelineOutcome::Persisted => "persisted",
            PipelineOutcome::EmptyAfterStrip => "empty_after_strip",
            PipelineOutcome::Replied { .. } => "replied",
            PipelineOutcome::Failed { .. } => "failed",
        }
    }

    pub fn reply(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Replied { reply } => Some(reply),
            _ => None,
        }
    }
}
