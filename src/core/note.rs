use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a note by the note store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub owner: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note that has not been saved yet.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner: String,
    pub title: String,
    pub content: String,
}

impl NewNote {
    pub fn new(
        owner: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Anything the hybrid engine can rank: an id plus the text fields used for
/// keyword matching and for building the embedding input.
pub trait SearchCandidate {
    fn note_id(&self) -> NoteId;
    fn title(&self) -> &str;
    fn content(&self) -> &str;

    /// Text sent to the embedding provider: `title + " " + content`.
    fn embedding_text(&self) -> String {
        format!("{} {}", self.title(), self.content())
    }
}

impl SearchCandidate for Note {
    fn note_id(&self) -> NoteId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str, content: &str) -> Note {
        let now = Utc::now();
        Note {
            id: NoteId(7),
            owner: "alice".to_string(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_embedding_text_joins_title_and_content() {
        let n = note("Groceries", "milk, eggs");
        assert_eq!(n.embedding_text(), "Groceries milk, eggs");
        assert_eq!(n.note_id(), NoteId(7));
    }

    #[test]
    fn test_note_id_serializes_as_integer() {
        let json = serde_json::to_string(&NoteId(42)).unwrap();
        assert_eq!(json, "42");
    }
}
