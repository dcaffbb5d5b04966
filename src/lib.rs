//! notes-search library
//!
//! Personal notes with hybrid keyword + semantic search.
//!
//! # Modules
//!
//! - `core`: Note model, SQLite note store, configuration
//! - `search`: Embedding provider, vector index, maintenance pipeline, hybrid engine
//! - `service`: Note service wiring the store to the search core

pub mod core;
pub mod search;
pub mod service;

// Re-exports for convenience
pub use core::config::Config;
pub use core::note::{NewNote, Note, NoteId, SearchCandidate};
pub use core::store::{NoteStore, SqliteNoteStore};
pub use search::{HybridSearchEngine, InMemoryVectorIndex, SearchHit, SearchMode, VectorStore};
pub use service::NoteService;
