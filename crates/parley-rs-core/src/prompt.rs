//! Prompt assembly for reply generation.

use crate::llm::text_message;
use autoagents_llm::chat::{ChatMessage, ChatRole};
use parley_rs_config::AssistantConfig;
use parley_rs_memory::{ContextMessage, Role};

/// Marker rendered in place of an empty long-term summary.
pub const EMPTY_MEMORY_MARKER: &str = "(none)";

/// Persona used when the config does not override it.
pub const DEFAULT_PERSONA: &str = "You are Parley, a friendly and concise assistant \
    taking part in a group chat. Answer the latest message directly and keep replies short. \
    Use what you know about the user when it is relevant, and never invent facts about them.";

/// Builds the ordered message sequence sent to the model for one reply.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: String,
    additional_instructions: Option<String>,
}

impl PromptBuilder {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            additional_instructions: None,
        }
    }

    /// Persona and extra instructions from the assistant config section.
    pub fn from_config(config: &AssistantConfig) -> Self {
        let persona = config
            .persona
            .as_deref()
            .map(str::trim)
            .filter(|persona| !persona.is_empty())
            .unwrap_or(DEFAULT_PERSONA);
        Self::new(persona).with_additional_instructions(config.additional_instructions.clone())
    }

    pub fn with_additional_instructions(mut self, instructions: Option<String>) -> Self {
        self.additional_instructions = instructions
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        self
    }

    /// Persona text plus any additional instructions.
    pub fn system_prompt(&self) -> String {
        match &self.additional_instructions {
            Some(extra) => format!("{}\n\n{}", self.persona, extra),
            None => self.persona.clone(),
        }
    }

    /// Assemble persona, memory line, history, and the new message, in that order.
    pub fn build(
        &self,
        summary: &str,
        history: &[ContextMessage],
        user_text: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 3);
        messages.push(text_message(ChatRole::System, self.system_prompt()));
        messages.push(text_message(ChatRole::System, memory_line(summary)));
        messages.extend(history.iter().map(|message| {
            let role = match message.role {
                Role::User => ChatRole::User,
                Role::Assistant => ChatRole::Assistant,
            };
            text_message(role, message.content.clone())
        }));
        messages.push(text_message(ChatRole::User, user_text));
        messages
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}

/// Summary text, or the empty marker when there is none.
pub fn render_summary(summary: &str) -> &str {
    let trimmed = summary.trim();
    if trimmed.is_empty() {
        EMPTY_MEMORY_MARKER
    } else {
        trimmed
    }
}

fn memory_line(summary: &str) -> String {
    format!("Long-term memory about this user: {}", render_summary(summary))
}
