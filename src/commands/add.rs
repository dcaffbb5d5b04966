//! Add command - save a new note

use anyhow::Result;
use colored::Colorize;
use notes_search::{NewNote, NoteStore};

use super::open_store;

/// Save the note. Its embedding is computed by the next process that
/// backfills (`search`, `index`, or a running MCP server's create path).
pub fn run(owner: &str, title: &str, content: &str, json: bool) -> Result<()> {
    let (_config, store) = open_store()?;
    let note = store.insert(NewNote::new(owner, title, content))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!(
            "{} Saved note {} ({})",
            "✓".green().bold(),
            format!("#{}", note.id).cyan(),
            note.title
        );
    }

    Ok(())
}
