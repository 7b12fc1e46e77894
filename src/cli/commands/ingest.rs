//! Ingest command implementation.

use super::{print_json, Context};
use crate::models::media::{MediaType, SourceType};
use anyhow::{bail, Context as _, Result};
use colored::Colorize;

/// Ingest a file already present on the server.
pub async fn ingest(
    ctx: &Context,
    path: &str,
    media_type: MediaType,
    source: SourceType,
    metadata: Option<&str>,
    poster: Option<&str>,
) -> Result<()> {
    let metadata = match metadata {
        Some(raw) => match serde_json::from_str::<serde_json::Value>(raw)
            .context("--metadata is not valid JSON")?
        {
            serde_json::Value::Object(map) => Some(map),
            _ => bail!("--metadata must be a JSON object"),
        },
        None => None,
    };

    let response = ctx
        .client
        .type_routed()?
        .ingest_media(media_type, path, source, metadata, poster)
        .await?;

    if ctx.json {
        return print_json(&response);
    }

    println!("{} Ingested {}", "[OK]".green(), path.bold());
    println!("  Media id:    {}", response.media_id);
    println!("  File hash:   {}", response.file_hash);
    println!("  Vector hash: {}", response.vector_hash);
    Ok(())
}
