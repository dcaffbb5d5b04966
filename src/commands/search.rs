//! Search command - hybrid keyword + semantic note search

use anyhow::Result;
use colored::Colorize;
use notes_search::SearchMode;

use super::{open_service, truncate};

pub async fn run(owner: &str, query: &str, json: bool) -> Result<()> {
    let service = open_service().await?;
    let outcome = service.search(owner, query).await?;

    if json {
        let json_results: Vec<_> = outcome
            .hits
            .iter()
            .map(|h| {
                serde_json::json!({
                    "id": h.candidate.id,
                    "title": h.candidate.title,
                    "content": h.candidate.content,
                    "score": h.score,
                    "keyword_match": h.keyword_match,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "mode": outcome.mode,
                "results": json_results,
            }))?
        );
        return Ok(());
    }

    if outcome.mode == SearchMode::KeywordOnly {
        println!(
            "{} Using keyword search (semantic index not available)",
            "!".yellow()
        );
        println!();
    }

    if outcome.hits.is_empty() {
        println!("{} No results found for: {}", "→".dimmed(), query.cyan());
        return Ok(());
    }

    println!(
        "{} {} results for: {}",
        "→".dimmed(),
        outcome.hits.len(),
        query.cyan()
    );
    println!();

    for (i, hit) in outcome.hits.iter().enumerate() {
        let score = match hit.score {
            Some(s) => {
                let score_str = format!("{:.2}", s);
                if s > 0.6 {
                    score_str.green()
                } else if s > 0.4 {
                    score_str.yellow()
                } else {
                    score_str.dimmed()
                }
            }
            None => "--".dimmed(),
        };
        let marker = if hit.keyword_match { " *" } else { "" };

        println!(
            "{}. [{}] {}{}",
            (i + 1).to_string().bold(),
            score,
            hit.candidate.title.cyan(),
            marker.dimmed()
        );
        if !hit.candidate.content.is_empty() {
            println!(
                "   {}",
                truncate(&hit.candidate.content.replace('\n', " "), 100).dimmed()
            );
        }
        println!();
    }

    Ok(())
}
