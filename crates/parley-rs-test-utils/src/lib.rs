//! Test helpers shared across Parley crates.

pub mod llm;
pub mod sink;
pub mod store;

pub use llm::{FailingLLM, FixedLLM, RecordingChatLLM, ScriptedLLM, SlowLLM, TextResponse};
pub use sink::{RecordingSink, SentMessage};
pub use store::FaultyStore;
