//! Conversation persistence for Parley.
//!
//! Owns the turn transcript and per-user summary records, the store trait the
//! rest of the workspace talks to, and the SQLite implementation.

pub mod error;
pub mod model;
mod schema;
pub mod sqlite;
pub mod store;

/// Store error type.
pub use error::StoreError;
/// Persisted record models.
pub use model::{ContextMessage, NewTurn, Role, Turn, UserMemory};
/// SQLite-backed store.
pub use sqlite::SqliteStore;
/// Store interface.
pub use store::ConversationStore;
