//! Catalog search and download commands.

use super::{print_json, Context};
use crate::core::ingest::{validate_search, CatalogIngest, CatalogService, DownloadState};
use crate::models::catalog::{
    CatalogDownloadRequest, CatalogDownloadResult, CatalogMatch, CatalogSearchOptions,
};
use crate::models::media::MediaType;
use anyhow::{bail, Result};
use colored::Colorize;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

fn spinner(message: String) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn print_matches(matches: &[CatalogMatch]) {
    if matches.is_empty() {
        println!("  {}", "No catalog matches found.".yellow());
        return;
    }

    for (index, m) in matches.iter().enumerate() {
        let movie = &m.catalog_movie;
        let mut details = Vec::new();
        if let Some(year) = movie.release_year() {
            details.push(format!("Released: {}", year));
        }
        if let Some(minutes) = movie.runtime_min {
            details.push(format!("{} min", minutes));
        }
        if let Some(rating) = movie.vote_average.filter(|r| *r > 0.0) {
            details.push(format!("Rating: {:.1}", rating));
        }

        println!(
            "  {:>2}. {}  {}",
            index + 1,
            m.display_title().bold(),
            details.join(" | ").dimmed()
        );
        let best = &m.best_candidate;
        let source = best.catalog_source.as_deref().unwrap_or("catalog");
        let score = best
            .score
            .map(|s| format!(" score {:.2}", s))
            .unwrap_or_default();
        let downloads = best
            .downloads
            .map(|d| format!(" {} downloads", d))
            .unwrap_or_default();
        println!(
            "      {} {}{}{}",
            source.cyan(),
            best.identifier,
            score,
            downloads
        );
        println!("      key: {}", m.match_key.dimmed());
    }
}

fn print_download(result: &CatalogDownloadResult) {
    let verb = if result.downloaded {
        "Downloaded"
    } else {
        "Planned"
    };
    println!("{} {} {}", "[OK]".green(), verb, result.title.bold());
    if let Some(ref destination) = result.destination {
        println!("  Destination: {}", destination);
    }
    if let Some(video) = result.video_path.as_ref().or(result.video_file.as_ref()) {
        println!("  Video:       {}", video);
    }
    if result.library_entry_created() {
        println!("  Library entry created");
    }
}

/// Search the catalog and list the matches.
pub async fn search(
    ctx: &Context,
    query: &str,
    year: Option<&str>,
    limit: usize,
    media_type: MediaType,
) -> Result<()> {
    let (query, year) = validate_search(query, year)?;
    let options = CatalogSearchOptions { limit, year };

    let pb = spinner(format!("Searching the catalog for {}...", query))?;
    let response = ctx.client.search_catalog(media_type, &query, &options).await;
    pb.finish_and_clear();
    let response = response?;

    if ctx.json {
        return print_json(&response);
    }

    println!(
        "{} {} ({} matches)",
        "Catalog:".bold().cyan(),
        query,
        response.matches.len()
    );
    print_matches(&response.matches);
    Ok(())
}

/// Search the catalog, then download the chosen matches concurrently.
#[allow(clippy::too_many_arguments)]
pub async fn ingest(
    ctx: &Context,
    query: &str,
    year: Option<&str>,
    limit: usize,
    media_type: MediaType,
    pick: &[usize],
    all: bool,
    plan: bool,
) -> Result<()> {
    let service: Arc<dyn CatalogService> = Arc::new(ctx.client.clone());
    let workflow = CatalogIngest::new(service, media_type).with_limit(limit);

    let pb = spinner(format!("Searching the catalog for {}...", query.trim()))?;
    let matches = workflow.search(query, year).await;
    pb.finish_and_clear();
    let matches = matches?;

    if !ctx.json {
        print_matches(&matches);
        println!();
    }

    let chosen: Vec<&CatalogMatch> = if all {
        matches.iter().collect()
    } else {
        let mut chosen = Vec::new();
        for &number in pick {
            match number.checked_sub(1).and_then(|i| matches.get(i)) {
                Some(m) => chosen.push(m),
                None => bail!("No match number {} (1-{})", number, matches.len()),
            }
        }
        chosen
    };

    if chosen.is_empty() {
        if ctx.json {
            return print_json(&matches);
        }
        if !matches.is_empty() {
            println!("Choose matches with --pick 1,2 or --all to download them.");
        }
        return Ok(());
    }

    let pb = spinner(format!("Downloading {} titles...", chosen.len()))?;
    let outcomes = join_all(
        chosen
            .iter()
            .map(|m| workflow.download(&m.match_key, !plan)),
    )
    .await;
    pb.finish_and_clear();

    let snapshot = workflow.snapshot().await;
    if ctx.json {
        let downloads: Vec<serde_json::Value> = chosen
            .iter()
            .map(|m| match snapshot.download_state(&m.match_key) {
                Some(DownloadState::Succeeded(result)) => serde_json::json!({
                    "matchKey": m.match_key,
                    "ok": true,
                    "result": result,
                }),
                Some(DownloadState::Failed(message)) => serde_json::json!({
                    "matchKey": m.match_key,
                    "ok": false,
                    "error": message,
                }),
                _ => serde_json::json!({ "matchKey": m.match_key, "ok": false }),
            })
            .collect();
        print_json(&downloads)?;
    } else {
        for (m, outcome) in chosen.iter().zip(&outcomes) {
            match (outcome, snapshot.download_state(&m.match_key)) {
                (Ok(result), _) => print_download(result),
                (Err(_), Some(DownloadState::Failed(message))) => {
                    println!("{} {}: {}", "[FAIL]".red(), m.display_title().bold(), message)
                }
                (Err(e), _) => println!("{} {}: {}", "[FAIL]".red(), m.display_title().bold(), e),
            }
        }
    }

    let failed = outcomes.iter().filter(|o| o.is_err()).count();
    if failed > 0 {
        bail!("{} of {} downloads failed", failed, outcomes.len());
    }
    Ok(())
}

/// Download a match by key from an earlier search.
pub async fn download(
    ctx: &Context,
    match_key: &str,
    media_type: MediaType,
    plan: bool,
) -> Result<()> {
    let request = if plan {
        CatalogDownloadRequest::plan(match_key)
    } else {
        CatalogDownloadRequest::execute(match_key)
    };

    let pb = spinner("Downloading...".to_string())?;
    let result = ctx.client.download_catalog(media_type, &request).await;
    pb.finish_and_clear();

    match result {
        Ok(result) if ctx.json => print_json(&result),
        Ok(result) => {
            print_download(&result);
            Ok(())
        }
        Err(e) => bail!(crate::core::ingest::download_failure_message(&e)),
    }
}
