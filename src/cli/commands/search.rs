//! Search command implementation.

use super::{item_line, print_json, Context};
use crate::models::media::{MediaType, SearchResults};
use crate::services::bitharbor::LocalSearchOptions;
use anyhow::{bail, Result};
use colored::Colorize;

/// Execute search command.
pub async fn execute_search(
    ctx: &Context,
    query: &str,
    media_type: Option<MediaType>,
    limit: Option<usize>,
    local: bool,
    min_score: f32,
) -> Result<()> {
    if query.trim().is_empty() {
        bail!("Enter something to search for");
    }

    let results = if local {
        let options = LocalSearchOptions {
            limit: limit.unwrap_or(LocalSearchOptions::default().limit),
            min_score,
        };
        ctx.client
            .type_routed()?
            .local_search(query.trim(), media_type, options)
            .await?
    } else {
        ctx.client
            .vector_search(query.trim(), media_type, limit)
            .await
    };

    if ctx.json {
        return print_json(&results);
    }
    print_results(query, &results);
    Ok(())
}

fn print_results(query: &str, results: &SearchResults) {
    println!(
        "{} {} ({} results)",
        "Search:".bold().cyan(),
        query,
        results.results.len()
    );

    if results.results.is_empty() {
        println!("  {}", "(nothing)".dimmed());
    }
    for scored in &results.results {
        println!("  {:>5.2}  {}", scored.score, item_line(&scored.item));
    }

    for failure in &results.failures {
        println!(
            "  {} {} search failed: {}",
            "[WARN]".yellow(),
            failure.media_type,
            failure.message
        );
    }
}
