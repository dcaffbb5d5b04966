//! Delete command

use anyhow::Result;
use colored::Colorize;
use notes_search::{NoteId, NoteStore};

use super::open_store;

pub fn run(id: i64) -> Result<()> {
    let (_config, store) = open_store()?;

    if store.delete(NoteId(id))? {
        println!("{} Deleted note #{}", "✓".green().bold(), id);
    } else {
        println!("{} No note #{}", "!".yellow().bold(), id);
    }

    Ok(())
}
