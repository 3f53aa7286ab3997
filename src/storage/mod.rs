use crate::error::{CajaError, Result};
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod types;
pub use types::{MessageRole, Session, SessionDetail, SessionSummary, StoredMessage};

/// Persistence operations for sessions and their messages
///
/// Messages are append-only; the only way to remove them is deleting the
/// whole session.
pub trait SessionStore: Send + Sync {
    /// Create an empty session
    fn create_session(&self, name: Option<&str>) -> Result<Session>;

    /// Fetch a session without its messages
    fn get_session(&self, id: &str) -> Result<Option<Session>>;

    /// Fetch a session together with all of its messages
    fn get_session_detail(&self, id: &str) -> Result<Option<SessionDetail>>;

    /// List sessions, most recently updated first
    fn list_sessions(&self) -> Result<Vec<SessionSummary>>;

    /// All messages of a session in insertion order; empty for unknown ids
    fn messages(&self, session_id: &str) -> Result<Vec<StoredMessage>>;

    /// Append one message to an existing session
    ///
    /// Fails with `CajaError::SessionNotFound` when the session is missing.
    fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<StoredMessage>;

    /// Delete a session and its messages; returns whether anything was removed
    fn delete_session(&self, id: &str) -> Result<bool>;
}

/// Run a store operation on tokio's blocking pool
///
/// `SessionStore` calls do synchronous file I/O, so async callers go through
/// here instead of calling the store on a runtime worker.
///
/// # Errors
///
/// Returns the operation's error, or `CajaError::Storage` if the blocking
/// task panicked or was cancelled.
pub async fn run_blocking<T, F>(store: &Arc<dyn SessionStore>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn SessionStore) -> Result<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| CajaError::Storage(format!("Storage task failed: {}", e)))?
}

/// SQLite-backed session storage
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Create a new storage instance
    ///
    /// Uses `CAJA_SESSION_DB` when set, otherwise `sessions.db` in the
    /// user's data directory.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("CAJA_SESSION_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "caja", "caja")
            .ok_or_else(|| CajaError::Storage("Could not determine data directory".into()))?;

        Self::new_with_path(proj_dirs.data_dir().join("sessions.db"))
    }

    /// Create a new storage instance that uses the specified database path.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Examples
    ///
    /// ```
    /// use caja::storage::SqliteStorage;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("sessions.db")).unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create parent directory for database")
                    .map_err(|e| CajaError::Storage(e.to_string()))?;
            }
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    /// Path of the backing database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| CajaError::Storage(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| CajaError::Storage(e.to_string()))?;
        Ok(conn)
    }

    fn init(&self) -> Result<()> {
        let conn = self.connect()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                session_name TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, seq);",
        )
        .context("Failed to create tables")
        .map_err(|e| CajaError::Storage(e.to_string()))?;

        Ok(())
    }
}

// Fixed-width form so `ORDER BY updated_at` sorts chronologically.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CajaError::Storage(format!("Invalid timestamp '{}': {}", value, e)).into())
}

type SessionRow = (String, Option<String>, String, String);
type MessageRow = (String, String, String, String, String);

fn session_row(row: &Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn message_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn to_session((id, session_name, created_at, updated_at): SessionRow) -> Result<Session> {
    Ok(Session {
        id,
        session_name,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn to_message((id, session_id, role, content, created_at): MessageRow) -> Result<StoredMessage> {
    Ok(StoredMessage {
        id,
        session_id,
        role: role.parse()?,
        content,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn load_session(conn: &Connection, id: &str) -> Result<Option<Session>> {
    let row = conn
        .query_row(
            "SELECT id, session_name, created_at, updated_at FROM sessions WHERE id = ?",
            params![id],
            session_row,
        )
        .optional()
        .context("Failed to query session")
        .map_err(|e| CajaError::Storage(e.to_string()))?;

    row.map(to_session).transpose()
}

fn load_messages(conn: &Connection, session_id: &str) -> Result<Vec<StoredMessage>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, session_id, role, content, created_at
            FROM messages
            WHERE session_id = ?
            ORDER BY seq ASC",
        )
        .context("Failed to prepare statement")
        .map_err(|e| CajaError::Storage(e.to_string()))?;

    let rows = stmt
        .query_map(params![session_id], message_row)
        .context("Failed to query messages")
        .map_err(|e| CajaError::Storage(e.to_string()))?;

    let mut messages = Vec::new();
    for row in rows {
        let row = row.map_err(|e| CajaError::Storage(e.to_string()))?;
        messages.push(to_message(row)?);
    }
    Ok(messages)
}

impl SessionStore for SqliteStorage {
    fn create_session(&self, name: Option<&str>) -> Result<Session> {
        let conn = self.connect()?;
        let now = Utc::now().trunc_subsecs(6);
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            session_name: name.map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO sessions (id, session_name, created_at, updated_at) VALUES (?, ?, ?, ?)",
            params![
                session.id,
                session.session_name,
                format_timestamp(now),
                format_timestamp(now)
            ],
        )
        .context("Failed to insert session")
        .map_err(|e| CajaError::Storage(e.to_string()))?;

        tracing::debug!(session_id = %session.id, "Created session");
        Ok(session)
    }

    fn get_session(&self, id: &str) -> Result<Option<Session>> {
        let conn = self.connect()?;
        load_session(&conn, id)
    }

    fn get_session_detail(&self, id: &str) -> Result<Option<SessionDetail>> {
        let conn = self.connect()?;
        match load_session(&conn, id)? {
            Some(session) => {
                let messages = load_messages(&conn, id)?;
                Ok(Some(SessionDetail { session, messages }))
            }
            None => Ok(None),
        }
    }

    fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let conn = self.connect()?;

        let mut stmt = conn
            .prepare(
                "SELECT s.id, s.session_name, s.created_at, s.updated_at,
                    (SELECT COUNT(*) FROM messages m WHERE m.session_id = s.id)
                FROM sessions s
                ORDER BY s.updated_at DESC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| CajaError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let count: i64 = row.get(4)?;
                Ok((session_row(row)?, count))
            })
            .context("Failed to query sessions")
            .map_err(|e| CajaError::Storage(e.to_string()))?;

        let mut sessions = Vec::new();
        for row in rows {
            let (raw, count) = row.map_err(|e| CajaError::Storage(e.to_string()))?;
            let session = to_session(raw)?;
            sessions.push(SessionSummary {
                id: session.id,
                session_name: session.session_name,
                created_at: session.created_at,
                updated_at: session.updated_at,
                message_count: count as usize,
            });
        }

        Ok(sessions)
    }

    fn messages(&self, session_id: &str) -> Result<Vec<StoredMessage>> {
        let conn = self.connect()?;
        load_messages(&conn, session_id)
    }

    fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<StoredMessage> {
        let mut conn = self.connect()?;
        let now = Utc::now().trunc_subsecs(6);
        let message = StoredMessage {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            created_at: now,
        };

        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| CajaError::Storage(e.to_string()))?;

        let touched = tx
            .execute(
                "UPDATE sessions SET updated_at = ? WHERE id = ?",
                params![format_timestamp(now), session_id],
            )
            .context("Failed to update session")
            .map_err(|e| CajaError::Storage(e.to_string()))?;

        if touched == 0 {
            return Err(CajaError::SessionNotFound(session_id.to_string()).into());
        }

        tx.execute(
            "INSERT INTO messages (id, session_id, role, content, created_at)
            VALUES (?, ?, ?, ?, ?)",
            params![
                message.id,
                message.session_id,
                role.as_str(),
                message.content,
                format_timestamp(now)
            ],
        )
        .context("Failed to insert message")
        .map_err(|e| CajaError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| CajaError::Storage(e.to_string()))?;

        Ok(message)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let conn = self.connect()?;
        let removed = conn
            .execute("DELETE FROM sessions WHERE id = ?", params![id])
            .context("Failed to delete session")
            .map_err(|e| CajaError::Storage(e.to_string()))?;

        Ok(removed > 0)
    }
}
