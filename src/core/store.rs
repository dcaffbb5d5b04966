//! Note store backed by SQLite
//!
//! The search core only needs ids and text from here; ownership scoping and
//! timestamps live with the notes themselves.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use super::note::{NewNote, Note, NoteId};

/// Persistence for notes. Implementations must be shareable across tasks.
pub trait NoteStore: Send + Sync {
    fn list_all(&self) -> Result<Vec<Note>>;
    fn list_for_owner(&self, owner: &str) -> Result<Vec<Note>>;
    fn get(&self, id: NoteId) -> Result<Option<Note>>;
    fn insert(&self, note: NewNote) -> Result<Note>;
    /// Returns `None` when no note has this id.
    fn update(&self, id: NoteId, title: &str, content: &str) -> Result<Option<Note>>;
    /// Returns whether a note was actually removed.
    fn delete(&self, id: NoteId) -> Result<bool>;
}

pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
}

const SELECT_COLUMNS: &str = "SELECT id, owner, title, content, created_at, updated_at FROM notes";

impl SqliteNoteStore {
    /// Open or create database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open note database {}", db_path.display()))?;
        Self::with_connection(conn)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_owner ON notes(owner);
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query_notes(&self, sql: &str, owner: Option<&str>) -> Result<Vec<Note>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = match owner {
            Some(owner) => stmt.query_map(params![owner], row_to_note)?,
            None => stmt.query_map([], row_to_note)?,
        };

        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }
}

impl NoteStore for SqliteNoteStore {
    fn list_all(&self) -> Result<Vec<Note>> {
        self.query_notes(&format!("{SELECT_COLUMNS} ORDER BY id"), None)
    }

    fn list_for_owner(&self, owner: &str) -> Result<Vec<Note>> {
        self.query_notes(
            &format!("{SELECT_COLUMNS} WHERE owner = ?1 ORDER BY id"),
            Some(owner),
        )
    }

    fn get(&self, id: NoteId) -> Result<Option<Note>> {
        let conn = self.conn.lock();
        let note = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.0],
                row_to_note,
            )
            .optional()?;
        Ok(note)
    }

    fn insert(&self, note: NewNote) -> Result<Note> {
        let now = Utc::now();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO notes (owner, title, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![note.owner, note.title, note.content, now.timestamp_millis()],
        )
        .context("Failed to insert note")?;

        Ok(Note {
            id: NoteId(conn.last_insert_rowid()),
            owner: note.owner,
            title: note.title,
            content: note.content,
            created_at: from_millis(now.timestamp_millis()),
            updated_at: from_millis(now.timestamp_millis()),
        })
    }

    fn update(&self, id: NoteId, title: &str, content: &str) -> Result<Option<Note>> {
        let now = Utc::now().timestamp_millis();
        let changed = {
            let conn = self.conn.lock();
            conn.execute(
                "UPDATE notes SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
                params![title, content, now, id.0],
            )?
        };

        if changed == 0 {
            return Ok(None);
        }
        self.get(id)
    }

    fn delete(&self, id: NoteId) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM notes WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }
}

fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: NoteId(row.get(0)?),
        owner: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        created_at: from_millis(row.get(4)?),
        updated_at: from_millis(row.get(5)?),
    })
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
