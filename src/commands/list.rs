//! List command - notes owned by a user

use anyhow::Result;
use colored::Colorize;
use notes_search::NoteStore;

use super::{open_store, print_note_line};

pub fn run(owner: &str, json: bool) -> Result<()> {
    let (_config, store) = open_store()?;
    let notes = store.list_for_owner(owner)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("{} No notes for {}", "→".dimmed(), owner.cyan());
        return Ok(());
    }

    println!("{} {} notes for {}", "→".dimmed(), notes.len(), owner.cyan());
    println!();
    for note in &notes {
        print_note_line(note);
    }

    Ok(())
}
