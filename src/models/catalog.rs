//! Catalog search and download models.
//!
//! A catalog match is only meaningful within the search that produced it:
//! its `match_key` is an opaque token handed back verbatim to request a
//! download, and the backend alone decides whether it is still valid.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Image reference returned by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub file_path: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub aspect_ratio: Option<f32>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub vote_count: Option<u32>,
    #[serde(default)]
    pub iso_639_1: Option<String>,
}

/// Denormalized title metadata for a catalog match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogMovie {
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub runtime_min: Option<u32>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub vote_count: Option<u32>,
    #[serde(default)]
    pub cast: Option<Vec<String>>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub catalog_source: Option<String>,
    #[serde(default)]
    pub catalog_id: Option<String>,
    #[serde(default)]
    pub poster: Option<ImageMetadata>,
    #[serde(default)]
    pub backdrop: Option<ImageMetadata>,
}

impl CatalogMovie {
    /// Release year, from the full release date when present.
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(year_of_date)
            .or(self.year)
    }
}

/// Parse the year out of an ISO-8601 date (`YYYY-MM-DD...`).
pub fn year_of_date(date: &str) -> Option<i32> {
    let day = date.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}

/// One downloadable source for a catalog match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogCandidate {
    pub identifier: String,
    /// Relevance in `0.0..=1.0`, when the backend scored it.
    #[serde(default)]
    pub score: Option<f32>,
    /// Popularity signal.
    #[serde(default)]
    pub downloads: Option<u64>,
    #[serde(default)]
    pub catalog_source: Option<String>,
    #[serde(default)]
    pub catalog_id: Option<String>,
    #[serde(default)]
    pub movie: Option<CatalogMovie>,
}

/// One resolution of a catalog query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMatch {
    pub match_key: String,
    #[serde(default)]
    pub tmdb_id: Option<u64>,
    #[serde(alias = "tmdb_movie")]
    pub catalog_movie: CatalogMovie,
    pub best_candidate: CatalogCandidate,
    #[serde(default)]
    pub candidates: Vec<CatalogCandidate>,
}

impl CatalogMatch {
    /// Title used in user-facing messages.
    pub fn display_title(&self) -> &str {
        if self.catalog_movie.title.trim().is_empty() {
            "catalog title"
        } else {
            &self.catalog_movie.title
        }
    }
}

/// Catalog search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSearchResponse {
    #[serde(default)]
    pub matches: Vec<CatalogMatch>,
    #[serde(default)]
    pub total: usize,
}

/// Options for a catalog search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSearchOptions {
    pub limit: usize,
    pub year: Option<u16>,
}

impl Default for CatalogSearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            year: None,
        }
    }
}

/// Download request for a catalog match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDownloadRequest {
    pub match_key: String,
    /// `false` asks the backend to plan the download without running it.
    pub execute: bool,
}

impl CatalogDownloadRequest {
    /// Request that executes the download.
    pub fn execute(match_key: impl Into<String>) -> Self {
        Self {
            match_key: match_key.into(),
            execute: true,
        }
    }

    /// Request that only plans the download.
    pub fn plan(match_key: impl Into<String>) -> Self {
        Self {
            match_key: match_key.into(),
            execute: false,
        }
    }
}

/// Outcome of a catalog download.
///
/// `downloaded: false` with a successful response means the download was
/// planned but not executed; it is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDownloadResult {
    pub match_key: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub video_file: Option<String>,
    #[serde(default)]
    pub metadata_xml_file: Option<String>,
    #[serde(default)]
    pub cover_art_file: Option<String>,
    #[serde(default)]
    pub subtitle_files: Option<Vec<String>>,
    pub downloaded: bool,
    #[serde(default)]
    pub video_path: Option<String>,
    #[serde(default)]
    pub subtitle_paths: Option<Vec<String>>,
    #[serde(default)]
    pub file_hash: Option<String>,
    #[serde(default)]
    pub vector_hash: Option<String>,
    #[serde(default)]
    pub vector_row_id: Option<i64>,
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub created: Option<bool>,
}

impl CatalogDownloadResult {
    /// Whether a library entry was created for the download.
    pub fn library_entry_created(&self) -> bool {
        self.created.unwrap_or(false)
    }

    /// Hashes of the produced files.
    pub fn file_hashes(&self) -> Vec<&str> {
        [self.file_hash.as_deref(), self.vector_hash.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }
}
