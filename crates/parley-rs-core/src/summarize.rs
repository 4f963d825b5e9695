//! Summary-update capability backed by the language model.

use crate::error::ParleyCoreError;
use crate::llm::{ModelClient, text_message};
use async_trait::async_trait;
use autoagents_llm::chat::{ChatMessage, ChatRole};

/// Default word ceiling for a summary.
pub const DEFAULT_SUMMARY_MAX_WORDS: usize = 40;

/// Produces an updated one-sentence summary from the current one and a new message.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// `current` is never empty; callers render a missing summary as `(none)`.
    async fn summarize(&self, current: &str, new_message: &str)
    -> Result<String, ParleyCoreError>;
}

/// [`Summarizer`] that asks the language model to rewrite the summary.
#[derive(Clone)]
pub struct LlmSummarizer {
    model: ModelClient,
    max_words: usize,
}

impl LlmSummarizer {
    pub fn new(model: ModelClient) -> Self {
        Self {
            model,
            max_words: DEFAULT_SUMMARY_MAX_WORDS,
        }
    }

    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words.max(1);
        self
    }

    /// Two-message prompt: instructions, then the current summary and new message.
    pub fn build_prompt(&self, current: &str, new_message: &str) -> Vec<ChatMessage> {
        vec![
            text_message(ChatRole::System, summary_instructions(self.max_words)),
            text_message(
                ChatRole::User,
                format!(
                    "Current summary: {current}\nNew message: {new_message}\nUpdated summary:"
                ),
            ),
        ]
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        current: &str,
        new_message: &str,
    ) -> Result<String, ParleyCoreError> {
        let prompt = self.build_prompt(current, new_message);
        self.model
            .complete(&prompt)
            .await
            .map_err(|err| ParleyCoreError::Summarization(err.to_string()))
    }
}

fn summary_instructions(max_words: usize) -> String {
    format!(
        "You maintain a long-term memory about one chat user. \
Rewrite the current summary so it also reflects the new message. \
Reply with exactly one sentence of at most {max_words} words that keeps only stable, durable facts \
about the user such as preferences, background, and ongoing projects. \
If the new message teaches nothing new, reply with the current summary unchanged, word for word. \
Do not invent details and do not add any other text."
    )
}
