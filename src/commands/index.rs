//! Index command - run the embedding backfill and report

use anyhow::Result;
use colored::Colorize;

use super::open_service;

pub async fn run(json: bool) -> Result<()> {
    if !json {
        println!("{} Building embedding index...", "→".dimmed());
    }

    let service = open_service().await?;
    let stats = service.backfill_stats();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "indexed": stats.indexed,
                "failed": stats.failed,
                "duration_ms": stats.duration_ms,
            })
        );
        return Ok(());
    }

    println!();
    println!(
        "{} Embedded {} notes in {:.2}s",
        "✓".green().bold(),
        stats.indexed.to_string().cyan(),
        stats.duration_ms as f64 / 1000.0
    );
    if stats.failed > 0 {
        println!("  {} {} notes failed", "✗".red(), stats.failed);
    }
    println!(
        "  {} Index is kept in memory and rebuilt on every start",
        "→".dimmed()
    );

    Ok(())
}
