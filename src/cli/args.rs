//! Command line argument definitions.

use crate::models::media::{MediaType, SourceType};
use crate::services::legacy::SortBy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Harbor - browse and manage your media server from the terminal
#[derive(Parser, Debug)]
#[command(name = "harbor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip preflight checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to config.toml (default: <config dir>/harbor/config.toml)
    #[arg(long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether the command needs a reachable backend and a session.
    pub fn needs_preflight(&self) -> bool {
        !matches!(
            self.command,
            Commands::Login { .. } | Commands::Logout | Commands::Health
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in to the configured backend
    Login {
        /// User name (email address on BitHarbor)
        #[arg(value_name = "USERNAME")]
        username: String,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Create the first administrator account instead (BitHarbor)
        #[arg(long)]
        setup: bool,

        /// Display name for --setup
        #[arg(long)]
        display_name: Option<String>,
    },

    /// Log out and forget the stored session
    Logout,

    /// Check that the backend is reachable
    Health,

    /// List libraries
    Libraries,

    /// List the items of a library
    Items {
        /// Library id (default: every item)
        #[arg(value_name = "LIBRARY_ID")]
        library_id: Option<String>,

        /// Only this media type (BitHarbor)
        #[arg(short = 't', long = "type")]
        media_type: Option<MediaType>,

        /// Maximum number of items
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Number of items to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Sort by: name, date-added, year, rating
        #[arg(long)]
        sort: Option<SortBy>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Filter by genre (repeatable)
        #[arg(short, long)]
        genre: Vec<String>,
    },

    /// Show one item
    Show {
        /// Item id
        #[arg(value_name = "ITEM_ID")]
        item_id: String,

        /// Media type, when known (avoids probing every type)
        #[arg(short = 't', long = "type")]
        media_type: Option<MediaType>,
    },

    /// Show continue watching, recently added and favorites
    Home {
        /// Items per section
        #[arg(short, long, default_value = "12")]
        limit: usize,
    },

    /// Add or remove a favorite
    Favorite {
        /// Item id
        #[arg(value_name = "ITEM_ID")]
        item_id: String,

        /// Remove instead of add
        #[arg(long)]
        remove: bool,
    },

    /// Mark an item as played
    Played {
        /// Item id
        #[arg(value_name = "ITEM_ID")]
        item_id: String,
    },

    /// Report a playback position
    Progress {
        /// Item id
        #[arg(value_name = "ITEM_ID")]
        item_id: String,

        /// Position in seconds
        #[arg(value_name = "SECONDS")]
        seconds: u64,

        /// Playback is paused
        #[arg(long)]
        paused: bool,

        /// Playback has stopped
        #[arg(long, conflicts_with = "paused")]
        stopped: bool,
    },

    /// Search the library
    Search {
        /// Search text
        #[arg(value_name = "QUERY")]
        query: String,

        /// Only this media type
        #[arg(short = 't', long = "type")]
        media_type: Option<MediaType>,

        /// Number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Quick keyword search instead of semantic search (BitHarbor)
        #[arg(long)]
        local: bool,

        /// Minimum score for --local
        #[arg(long, default_value = "0.2")]
        min_score: f32,
    },

    /// Find and download titles from the upstream catalog (BitHarbor)
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Ingest a file already on the server (BitHarbor)
    Ingest {
        /// Server-side file path
        #[arg(value_name = "PATH")]
        path: String,

        /// Media type
        #[arg(short = 't', long = "type")]
        media_type: MediaType,

        /// Source: catalog or home
        #[arg(long, default_value = "home")]
        source: SourceType,

        /// Extra metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,

        /// Server-side poster path
        #[arg(long)]
        poster: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CatalogAction {
    /// Search the catalog
    Search {
        /// Title to search for
        #[arg(value_name = "QUERY")]
        query: String,

        /// Release year
        #[arg(short, long)]
        year: Option<String>,

        /// Maximum number of matches
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Media type
        #[arg(short = 't', long = "type", default_value = "movie")]
        media_type: MediaType,
    },

    /// Search the catalog, then download the chosen matches
    Ingest {
        /// Title to search for
        #[arg(value_name = "QUERY")]
        query: String,

        /// Release year
        #[arg(short, long)]
        year: Option<String>,

        /// Maximum number of matches
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Media type
        #[arg(short = 't', long = "type", default_value = "movie")]
        media_type: MediaType,

        /// Match numbers to download, as listed (e.g. --pick 1,3)
        #[arg(long, value_delimiter = ',')]
        pick: Vec<usize>,

        /// Download every match
        #[arg(long, conflicts_with = "pick")]
        all: bool,

        /// Plan the downloads without running them
        #[arg(long)]
        plan: bool,
    },

    /// Download a match by key
    Download {
        /// Match key from a catalog search
        #[arg(value_name = "MATCH_KEY")]
        match_key: String,

        /// Media type
        #[arg(short = 't', long = "type", default_value = "movie")]
        media_type: MediaType,

        /// Plan the download without running it
        #[arg(long)]
        plan: bool,
    },
}
