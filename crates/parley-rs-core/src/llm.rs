//! Language-model access with bounded timeouts and retries.

use crate::error::ModelError;
use autoagents_llm::LLMProvider;
use autoagents_llm::chat::{ChatMessage, ChatProvider, ChatRole, MessageType};
use log::{debug, warn};
use parley_rs_config::ModelConfig;
use std::sync::Arc;
use std::time::Duration;

/// Per-client call policy.
///
/// `temperature` is bound into the provider when it is built; it is kept here
/// so callers can log and construct providers from one value.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub temperature: f32,
    /// Upper bound on a single provider call.
    pub timeout: Duration,
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_backoff: Duration,
}

impl ModelSettings {
    /// Settings for reply generation.
    pub fn for_replies(config: &ModelConfig) -> Self {
        Self::from_config(config, config.reply_temperature)
    }

    /// Settings for summary updates.
    pub fn for_summaries(config: &ModelConfig) -> Self {
        Self::from_config(config, config.summary_temperature)
    }

    fn from_config(config: &ModelConfig, temperature: f32) -> Self {
        Self {
            temperature,
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.retry_backoff.saturating_mul(factor)
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::for_replies(&ModelConfig::default())
    }
}

/// Thin wrapper that turns a chat provider into a text-completion call.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn LLMProvider>,
    settings: ModelSettings,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn LLMProvider>, settings: ModelSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Send `messages` and return the trimmed text of the first completion.
    ///
    /// Provider errors and timeouts are retried; an empty completion is not.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let attempts = self.settings.max_retries.saturating_add(1);
        let mut last_error = ModelError::Empty;
        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.settings.backoff_for(attempt);
                debug!(
                    "retrying model call (attempt={}, delay_ms={})",
                    attempt + 1,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            let call = self.provider.chat_with_tools(messages, None, None);
            match tokio::time::timeout(self.settings.timeout, call).await {
                Ok(Ok(response)) => {
                    let text = response.text().unwrap_or_default();
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        return Err(ModelError::Empty);
                    }
                    debug!(
                        "model call completed (attempt={}, messages={}, chars={})",
                        attempt + 1,
                        messages.len(),
                        trimmed.len()
                    );
                    return Ok(trimmed.to_string());
                }
                Ok(Err(err)) => {
                    warn!(
                        "model call failed (attempt={}, max_attempts={}, error={})",
                        attempt + 1,
                        attempts,
                        err
                    );
                    last_error = ModelError::Provider(err.to_string());
                }
                Err(_) => {
                    warn!(
                        "model call timed out (attempt={}, max_attempts={}, timeout_ms={})",
                        attempt + 1,
                        attempts,
                        self.settings.timeout.as_millis()
                    );
                    last_error = ModelError::TimedOut(self.settings.timeout);
                }
            }
        }
        Err(last_error)
    }
}

/// Plain-text chat message.
pub(crate) fn text_message(role: ChatRole, content: impl Into<String>) -> ChatMessage {
    ChatMessage {
        role,
        message_type: MessageType::Text,
        content: content.into(),
    }
}
