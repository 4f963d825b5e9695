//! Error types for store operations.

/// Errors returned by conversation stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite error, including constraint violations.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// IO error while preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Role text outside the `user`/`assistant` set.
    #[error("invalid role: {0}")]
    InvalidRole(String),
    /// Turn content was empty or whitespace.
    #[error("turn content must not be empty")]
    EmptyContent,
    /// Database was written by a newer schema.
    #[error("unsupported schema version: {0}")]
    UnsupportedSchema(u32),
    /// The store was closed.
    #[error("store is closed")]
    Closed,
    /// Blocking store task failed to complete.
    #[error("store task failed: {0}")]
    Join(String),
}
