//! Error types for the core pipeline crate.

use parley_rs_memory::StoreError;
use parley_rs_protocol::SendError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by pipeline operations.
#[derive(Debug, Error)]
pub enum ParleyCoreError {
    /// Conversation store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Reply generation failed or produced no usable text.
    #[error("generation error: {0}")]
    Generation(String),
    /// Summary update failed.
    #[error("summarization error: {0}")]
    Summarization(String),
    /// Delivering a message to the channel failed.
    #[error("send error: {0}")]
    Send(#[from] SendError),
    /// Invalid runtime configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Failures of a single language-model invocation.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Every attempt exceeded the per-call timeout.
    #[error("model call timed out after {0:?}")]
    TimedOut(Duration),
    /// Provider returned an error on the final attempt.
    #[error("provider error: {0}")]
    Provider(String),
    /// Provider answered without any text.
    #[error("model returned no completion text")]
    Empty,
}
