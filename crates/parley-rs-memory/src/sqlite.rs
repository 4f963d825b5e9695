//! SQLite-backed conversation store.

use crate::error::StoreError;
use crate::model::{NewTurn, Role, Turn, UserMemory};
use crate::schema;
use crate::store::ConversationStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How long a writer waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Store backed by a single SQLite connection shared by all tasks.
///
/// Queries run on the blocking pool so the async runtime never waits on disk.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStore {
    /// Open (or create) a database file and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(&path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        schema::migrate(&mut conn)?;
        info!(
            "opened sqlite store (path={}, journal_mode={})",
            path.display(),
            mode
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut conn = Connection::open_in_memory()?;
        schema::migrate(&mut conn)?;
        debug!("opened in-memory sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Checkpoint the WAL and close the connection.
    ///
    /// Later operations on any clone of this store fail with `StoreError::Closed`.
    pub async fn close(&self) -> Result<(), StoreError> {
        let slot = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let Some(conn) = slot.lock().take() else {
                return Ok(());
            };
            if let Err(err) = conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);") {
                warn!("wal checkpoint failed on close (error={})", err);
            }
            conn.close().map_err(|(_, err)| StoreError::Sqlite(err))?;
            info!("closed sqlite store");
            Ok(())
        })
        .await
        .map_err(|err| StoreError::Join(err.to_string()))?
    }

    /// Run a closure against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let slot = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = slot.lock();
            let conn = guard.as_mut().ok_or(StoreError::Closed)?;
            op(conn)
        })
        .await
        .map_err(|err| StoreError::Join(err.to_string()))?
    }

    /// Newest-first turns of a channel whose id is below `before_id`.
    async fn load_turns(
        &self,
        channel_id: &str,
        before_id: i64,
        limit: usize,
    ) -> Result<Vec<Turn>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let channel_id = channel_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, guild_id, channel_id, author_id, role, content, created_at
                 FROM turns
                 WHERE channel_id = ?1 AND id < ?2
                 ORDER BY id DESC
                 LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![channel_id, before_id, limit], turn_from_row)?;
            let mut turns = Vec::new();
            for row in rows {
                turns.push(row?);
            }
            debug!(
                "loaded turns (channel_id={}, before_id={}, returned={})",
                channel_id,
                before_id,
                turns.len()
            );
            Ok(turns)
        })
        .await
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err: StoreError| FromSqlError::Other(Box::new(err)))
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn append_turn(&self, turn: NewTurn) -> Result<Turn, StoreError> {
        if turn.content.trim().is_empty() {
            return Err(StoreError::EmptyContent);
        }
        self.with_conn(move |conn| {
            let id: i64 = conn.query_row(
                "INSERT INTO turns (guild_id, channel_id, author_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING id",
                params![
                    turn.guild_id,
                    turn.channel_id,
                    turn.author_id,
                    turn.role,
                    turn.content,
                    turn.created_at,
                ],
                |row| row.get(0),
            )?;
            debug!(
                "appended turn (id={}, channel_id={}, role={}, content_len={})",
                id,
                turn.channel_id,
                turn.role,
                turn.content.len()
            );
            Ok(Turn {
                id,
                guild_id: turn.guild_id,
                channel_id: turn.channel_id,
                author_id: turn.author_id,
                role: turn.role,
                content: turn.content,
                created_at: turn.created_at,
            })
        })
        .await
    }

    async fn recent_turns(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, StoreError> {
        self.load_turns(channel_id, i64::MAX, limit).await
    }

    async fn turns_before(
        &self,
        channel_id: &str,
        before_id: i64,
        limit: usize,
    ) -> Result<Vec<Turn>, StoreError> {
        self.load_turns(channel_id, before_id, limit).await
    }

    async fn count_turns(&self, channel_id: &str) -> Result<usize, StoreError> {
        let channel_id = channel_id.to_string();
        self.with_conn(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM turns WHERE channel_id = ?1",
                params![channel_id],
                |row| row.get(0),
            )?;
            Ok(usize::try_from(count).unwrap_or_default())
        })
        .await
    }

    async fn delete_turns(&self, channel_id: &str) -> Result<usize, StoreError> {
        let channel_id = channel_id.to_string();
        self.with_conn(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM turns WHERE channel_id = ?1",
                params![channel_id],
            )?;
            info!(
                "deleted channel turns (channel_id={}, deleted={})",
                channel_id, deleted
            );
            Ok(deleted)
        })
        .await
    }

    async fn get_user_memory(&self, user_id: &str) -> Result<Option<UserMemory>, StoreError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let memory = conn
                .query_row(
                    "SELECT user_id, summary, updated_at FROM user_memory WHERE user_id = ?1",
                    params![user_id],
                    |row| {
                        Ok(UserMemory {
                            user_id: row.get(0)?,
                            summary: row.get(1)?,
                            updated_at: row.get::<_, DateTime<Utc>>(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(memory)
        })
        .await
    }

    async fn upsert_summary(&self, user_id: &str, summary: &str) -> Result<(), StoreError> {
        let user_id = user_id.to_string();
        let summary = summary.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO user_memory (user_id, summary, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id) DO UPDATE SET
                     summary = excluded.summary,
                     updated_at = excluded.updated_at",
                params![user_id, summary, Utc::now()],
            )?;
            debug!(
                "upserted user summary (user_id={}, summary_len={})",
                user_id,
                summary.len()
            );
            Ok(())
        })
        .await
    }

    async fn delete_summary(&self, user_id: &str) -> Result<bool, StoreError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM user_memory WHERE user_id = ?1",
                params![user_id],
            )?;
            info!(
                "deleted user summary (user_id={}, existed={})",
                user_id,
                deleted > 0
            );
            Ok(deleted > 0)
        })
        .await
    }
}

fn turn_from_row(row: &Row<'_>) -> rusqlite::Result<Turn> {
    Ok(Turn {
        id: row.get(0)?,
        guild_id: row.get(1)?,
        channel_id: row.get(2)?,
        author_id: row.get(3)?,
        role: row.get(4)?,
        content: row.get(5)?,
        created_at: row.get(6)?,
    })
}
