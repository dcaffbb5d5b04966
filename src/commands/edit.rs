//! Edit command - replace a note's title and content

use anyhow::Result;
use colored::Colorize;
use notes_search::{NoteId, NoteStore};

use super::open_store;

pub fn run(id: i64, title: &str, content: &str) -> Result<()> {
    let (_config, store) = open_store()?;

    match store.update(NoteId(id), title, content)? {
        Some(note) => println!(
            "{} Updated note {} ({})",
            "✓".green().bold(),
            format!("#{}", note.id).cyan(),
            note.title
        ),
        None => {
            eprintln!("{} Note not found: #{}", "Error:".red().bold(), id);
            std::process::exit(1);
        }
    }

    Ok(())
}
