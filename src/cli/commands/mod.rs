//! CLI command implementations.

pub mod account;
pub mod browse;
pub mod catalog;
pub mod ingest;
pub mod playback;
pub mod search;

use crate::core::facade::UnifiedClient;
use crate::models::config::{load_config, Config};
use crate::models::media::MediaItem;
use crate::services::session::{Session, SessionStore};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Everything a command needs: the client, the session store and the
/// output mode.
pub struct Context {
    pub config: Config,
    pub client: UnifiedClient,
    pub store: SessionStore,
    pub json: bool,
}

impl Context {
    /// Load configuration, restore the stored session and build the client.
    ///
    /// A stored session for another backend is ignored.
    pub fn load(config_path: Option<&Path>, json: bool) -> Result<Self> {
        let config = load_config(config_path)?;
        let store = SessionStore::new(config.session_file.clone());
        let session = Arc::new(Session::new());

        match store.load() {
            Ok(Some(data)) if data.backend == config.backend => {
                tracing::debug!("Restored session for {}", data.user_name);
                session.set(data);
            }
            Ok(Some(data)) => {
                tracing::debug!("Ignoring stored session for the {} backend", data.backend);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not read stored session: {}", e),
        }

        let client = UnifiedClient::from_config(&config, session)?;
        Ok(Self {
            config,
            client,
            store,
            json,
        })
    }
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line summary of an item.
pub fn item_line(item: &MediaItem) -> String {
    let year = item
        .production_year
        .map(|y| format!(" ({})", y))
        .unwrap_or_default();
    let runtime = item
        .runtime_in_minutes()
        .map(|m| format!(" {} min", m))
        .unwrap_or_default();
    let favorite = if item.user_data.is_favorite { " *" } else { "" };
    format!(
        "{:<10} {}{}{}{}  {}",
        item.media_type.as_str().cyan(),
        item.name.bold(),
        year,
        runtime.dimmed(),
        favorite.yellow(),
        item.id.dimmed()
    )
}

/// Print a list of items, or a placeholder when empty.
pub fn print_items(items: &[MediaItem]) {
    if items.is_empty() {
        println!("  {}", "(nothing)".dimmed());
        return;
    }
    for item in items {
        println!("  {}", item_line(item));
    }
}
