//! Personal notes database
//!
//! The SQL agent works against this SQLite file. Only the schema is owned
//! here; rows are created and edited by the agent's own SQL.

use crate::error::{CajaError, Result};
use anyhow::Context;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

const NOTES_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    is_archived INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS note_tag (
    note_id INTEGER NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (note_id, tag_id)
);
";

/// Handle to the notes database file
#[derive(Debug, Clone)]
pub struct NotesDatabase {
    path: PathBuf,
}

impl NotesDatabase {
    /// Open (and create if absent) the notes database at `path`
    ///
    /// # Errors
    ///
    /// Returns `CajaError::Storage` if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create parent directory for notes database")
                    .map_err(|e| CajaError::Storage(e.to_string()))?;
            }
        }

        let db = Self { path };
        db.connect()?
            .execute_batch(NOTES_SCHEMA)
            .context("Failed to create notes tables")
            .map_err(|e| CajaError::Storage(e.to_string()))?;

        tracing::debug!("Notes database ready at {}", db.path.display());
        Ok(db)
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection with foreign keys enforced
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)
            .context("Failed to open notes database")
            .map_err(|e| CajaError::Storage(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| CajaError::Storage(e.to_string()))?;
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_schema() {
        let dir = tempdir().unwrap();
        let db = NotesDatabase::open(dir.path().join("notes.db")).unwrap();
        let conn = db.connect().unwrap();

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(names, vec!["note_tag", "notes", "tags"]);
    }

    #[test]
    fn test_open_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.db");
        NotesDatabase::open(&path).unwrap();
        assert!(NotesDatabase::open(&path).is_ok());
    }

    #[test]
    fn test_deleting_note_cascades_tags() {
        let dir = tempdir().unwrap();
        let db = NotesDatabase::open(dir.path().join("notes.db")).unwrap();
        let conn = db.connect().unwrap();
        conn.execute_batch(
            "INSERT INTO notes (title, content) VALUES ('groceries', 'milk');
             INSERT INTO tags (name) VALUES ('home');
             INSERT INTO note_tag (note_id, tag_id) VALUES (1, 1);
             DELETE FROM notes WHERE id = 1;",
        )
        .unwrap();

        let links: i64 = conn
            .query_row("SELECT count(*) FROM note_tag", [], |r| r.get(0))
            .unwrap();
        assert_eq!(links, 0);
    }
}
