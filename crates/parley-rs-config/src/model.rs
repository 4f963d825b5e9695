//! Configuration schema for Parley.

use serde::{Deserialize, Serialize};

/// Root config for the Parley assistant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParleyConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
}

impl ParleyConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> ParleyConfigBuilder {
        ParleyConfigBuilder::new()
    }
}

/// Builder for assembling a `ParleyConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct ParleyConfigBuilder {
    config: ParleyConfig,
}

impl ParleyConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: ParleyConfig::default(),
        }
    }

    /// Replace the assistant persona and addressing configuration.
    pub fn assistant(mut self, assistant: AssistantConfig) -> Self {
        self.config.assistant = assistant;
        self
    }

    /// Replace the memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the language model configuration.
    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    /// Replace the store configuration.
    pub fn store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    /// Replace the concurrency configuration.
    pub fn concurrency(mut self, concurrency: ConcurrencyConfig) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Finalize and return the built `ParleyConfig`.
    pub fn build(self) -> ParleyConfig {
        self.config
    }
}

/// Persona and addressing settings for the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Replaces the built-in persona instruction when set.
    #[serde(default)]
    pub persona: Option<String>,
    /// Appended to the persona instruction.
    #[serde(default)]
    pub additional_instructions: Option<String>,
    /// Prefix marker that addresses the assistant.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Message sent to the channel when a reply cannot be produced.
    #[serde(default = "default_apology")]
    pub apology: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            persona: None,
            additional_instructions: None,
            prefix: default_prefix(),
            apology: default_apology(),
        }
    }
}

fn default_prefix() -> String {
    "!ask".to_string()
}

fn default_apology() -> String {
    "Sorry, something went wrong while generating a reply.".to_string()
}

/// How the long-term memory update is scheduled after a reply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemoryUpdateMode {
    /// Spawn the update and return as soon as the reply is persisted.
    #[default]
    Background,
    /// Await the update before the pipeline completes.
    Inline,
}

/// Short-term and long-term memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of recent channel turns supplied as short-term context.
    #[serde(default = "default_context_turns")]
    pub context_turns: usize,
    /// Soft word limit communicated to the summarizer.
    #[serde(default = "default_summary_max_words")]
    pub summary_max_words: usize,
    #[serde(default)]
    pub update_mode: MemoryUpdateMode,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            context_turns: default_context_turns(),
            summary_max_words: default_summary_max_words(),
            update_mode: MemoryUpdateMode::default(),
        }
    }
}

/// Default number of context turns.
fn default_context_turns() -> usize {
    10
}

/// Default summary word budget.
fn default_summary_max_words() -> usize {
    40
}

/// Language model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_provider")]
    pub provider: String,
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_reply_temperature")]
    pub reply_temperature: f32,
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_model_provider(),
            name: default_model_name(),
            reply_temperature: default_reply_temperature(),
            summary_temperature: default_summary_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_model_provider() -> String {
    "openai".to_string()
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_reply_temperature() -> f32 {
    0.4
}

fn default_summary_temperature() -> f32 {
    0.2
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

/// Persistent store settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Database path; defaults to `~/.parley/parley.db` when unset.
    #[serde(default)]
    pub path: Option<String>,
}

/// Task serialization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Serialize pipelines per channel and memory updates per user.
    #[serde(default = "default_serialize_per_channel")]
    pub serialize_per_channel: bool,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            serialize_per_channel: default_serialize_per_channel(),
        }
    }
}

fn default_serialize_per_channel() -> bool {
    true
}
