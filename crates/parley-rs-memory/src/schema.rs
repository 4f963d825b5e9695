//! SQLite schema and migrations.

use crate::error::StoreError;
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};

/// Schema version written by this build.
pub(crate) const SCHEMA_VERSION: u32 = 1;

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS turns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    guild_id TEXT,
    channel_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
    content TEXT NOT NULL CHECK (length(trim(content)) > 0),
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS turns_channel_id_idx ON turns (channel_id, id DESC);
CREATE TABLE IF NOT EXISTS user_memory (
    user_id TEXT PRIMARY KEY NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL
);
";

/// Create or upgrade the schema in a single transaction.
pub(crate) fn migrate(conn: &mut Connection) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;
    let current: Option<u32> = tx
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()?
        .flatten();
    match current {
        Some(version) if version > SCHEMA_VERSION => {
            return Err(StoreError::UnsupportedSchema(version));
        }
        Some(version) if version == SCHEMA_VERSION => {
            debug!("schema up to date (version={})", version);
        }
        _ => {
            tx.execute_batch(SCHEMA_V1)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
            info!("applied schema migration (version={})", SCHEMA_VERSION);
        }
    }
    tx.commit()?;
    Ok(())
}
