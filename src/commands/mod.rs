pub mod add;
pub mod delete;
pub mod edit;
pub mod index;
pub mod list;
pub mod search;

use anyhow::{Context, Result};
use colored::Colorize;
use notes_search::core::paths::NotesPaths;
use notes_search::{Config, Note, NoteService, SqliteNoteStore};

/// Load config and open the SQLite note store, creating `.notes/` if needed.
pub fn open_store() -> Result<(Config, SqliteNoteStore)> {
    let paths = NotesPaths::current();
    let config = Config::load(&paths.config)?;
    let db_path = config.database_path(&paths.root);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let store = SqliteNoteStore::open(&db_path)?;
    Ok((config, store))
}

/// Open the store and run the startup backfill.
///
/// The vector index lives in memory, so every process that searches has to
/// rebuild it first.
pub async fn open_service() -> Result<NoteService<SqliteNoteStore>> {
    let (config, store) = open_store()?;
    NoteService::from_config(store, &config).await
}

/// Truncate for display (char-aware for Unicode)
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}

pub fn print_note_line(note: &Note) {
    println!(
        "{} {}",
        format!("#{}", note.id).dimmed(),
        note.title.cyan()
    );
    if !note.content.is_empty() {
        println!("   {}", truncate(&note.content.replace('\n', " "), 100).dimmed());
    }
}
