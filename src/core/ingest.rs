//! Catalog ingest workflow.
//!
//! Search the upstream catalog, then download any of the matches. The match
//! list stays usable after every download so several titles can be fetched
//! from one search. Downloads of different matches run concurrently; a
//! match only refuses a second download while its first is in flight.

use crate::models::catalog::{
    CatalogDownloadRequest, CatalogDownloadResult, CatalogMatch, CatalogSearchOptions,
    CatalogSearchResponse,
};
use crate::models::media::MediaType;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Backend operations the workflow needs.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn search_catalog(
        &self,
        media_type: MediaType,
        query: &str,
        options: &CatalogSearchOptions,
    ) -> Result<CatalogSearchResponse>;

    async fn download_catalog(
        &self,
        media_type: MediaType,
        request: &CatalogDownloadRequest,
    ) -> Result<CatalogDownloadResult>;
}

/// State of the search half of the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Searching,
    MatchesFound,
    NoMatches,
    SearchFailed(String),
}

/// State of one match's download.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadState {
    Downloading,
    Succeeded(CatalogDownloadResult),
    Failed(String),
}

impl DownloadState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, DownloadState::Downloading)
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Latest message to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Point-in-time view of the workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestSnapshot {
    pub search: SearchState,
    pub query: Option<String>,
    pub matches: Vec<CatalogMatch>,
    pub downloads: HashMap<String, DownloadState>,
    pub notice: Option<Notice>,
}

impl IngestSnapshot {
    pub fn download_state(&self, match_key: &str) -> Option<&DownloadState> {
        self.downloads.get(match_key)
    }
}

#[derive(Debug)]
struct IngestState {
    search: SearchState,
    query: Option<String>,
    matches: Vec<CatalogMatch>,
    downloads: HashMap<String, DownloadState>,
    notice: Option<Notice>,
}

impl Default for IngestState {
    fn default() -> Self {
        Self {
            search: SearchState::Idle,
            query: None,
            matches: Vec::new(),
            downloads: HashMap::new(),
            notice: None,
        }
    }
}

/// Validate a search query and optional year before anything is sent.
///
/// Returns the trimmed query and the parsed year. A blank year means none.
pub fn validate_search(query: &str, year: Option<&str>) -> Result<(String, Option<u16>)> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::validation("Enter a title to search"));
    }

    let year = match year.map(str::trim).filter(|y| !y.is_empty()) {
        Some(y) => Some(
            y.parse::<u16>()
                .map_err(|_| Error::validation("Year must be a number"))?,
        ),
        None => None,
    };

    Ok((query.to_string(), year))
}

/// User-facing message for a failed download.
pub fn download_failure_message(error: &Error) -> String {
    match error.status() {
        Some(404) | Some(410) => {
            "This catalog match is no longer available. Search again.".to_string()
        }
        _ => format!("Download failed: {}", error),
    }
}

/// Search-then-download workflow over a [`CatalogService`].
pub struct CatalogIngest {
    service: Arc<dyn CatalogService>,
    media_type: MediaType,
    limit: usize,
    state: Mutex<IngestState>,
}

impl CatalogIngest {
    pub fn new(service: Arc<dyn CatalogService>, media_type: MediaType) -> Self {
        Self {
            service,
            media_type,
            limit: CatalogSearchOptions::default().limit,
            state: Mutex::new(IngestState::default()),
        }
    }

    /// Change the number of matches requested per search.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Search the catalog.
    ///
    /// Invalid input fails without contacting the backend and leaves the
    /// state untouched. A backend failure keeps the previous matches.
    pub async fn search(&self, query: &str, year: Option<&str>) -> Result<Vec<CatalogMatch>> {
        let (query, year) = validate_search(query, year)?;

        {
            let mut state = self.state.lock().await;
            state.search = SearchState::Searching;
            state.query = Some(query.clone());
        }

        let options = CatalogSearchOptions {
            limit: self.limit,
            year,
        };
        let outcome = self
            .service
            .search_catalog(self.media_type, &query, &options)
            .await;

        let mut state = self.state.lock().await;
        match outcome {
            Ok(response) => {
                info!("Catalog search for {:?} found {} matches", query, response.matches.len());
                let keys: Vec<&str> = response.matches.iter().map(|m| m.match_key.as_str()).collect();
                state
                    .downloads
                    .retain(|key, download| download.is_in_flight() || keys.contains(&key.as_str()));

                if response.matches.is_empty() {
                    state.search = SearchState::NoMatches;
                    state.notice = Some(Notice::error("No catalog matches found."));
                } else {
                    state.search = SearchState::MatchesFound;
                    state.notice = None;
                }
                state.matches = response.matches.clone();
                Ok(response.matches)
            }
            Err(e) => {
                warn!("Catalog search for {:?} failed: {}", query, e);
                let message = format!("Catalog search failed: {}", e);
                state.search = SearchState::SearchFailed(message.clone());
                state.notice = Some(Notice::error(message));
                Err(e)
            }
        }
    }

    /// Download one of the current matches.
    ///
    /// Fails immediately if the key is not among the current matches or a
    /// download for it is already running. A failed download leaves the
    /// match in place so it can be retried.
    pub async fn download(&self, match_key: &str, execute: bool) -> Result<CatalogDownloadResult> {
        let title = {
            let mut state = self.state.lock().await;
            let title = state
                .matches
                .iter()
                .find(|m| m.match_key == match_key)
                .map(|m| m.display_title().to_string())
                .ok_or_else(|| {
                    Error::validation("Unknown catalog match. Search again.")
                })?;

            if state
                .downloads
                .get(match_key)
                .is_some_and(DownloadState::is_in_flight)
            {
                return Err(Error::DownloadInFlight(match_key.to_string()));
            }

            state
                .downloads
                .insert(match_key.to_string(), DownloadState::Downloading);
            state.notice = Some(Notice::success(format!("Download started. Fetching {}", title)));
            title
        };

        let request = if execute {
            CatalogDownloadRequest::execute(match_key)
        } else {
            CatalogDownloadRequest::plan(match_key)
        };
        let outcome = self.service.download_catalog(self.media_type, &request).await;

        let mut state = self.state.lock().await;
        match outcome {
            Ok(result) => {
                let shown = if result.title.trim().is_empty() {
                    title
                } else {
                    result.title.clone()
                };
                let message = if result.downloaded {
                    format!("Download completed for {}", shown)
                } else {
                    format!("Download planned for {}", shown)
                };
                info!("{}", message);
                state.notice = Some(Notice::success(message));
                state
                    .downloads
                    .insert(match_key.to_string(), DownloadState::Succeeded(result.clone()));
                Ok(result)
            }
            Err(e) => {
                warn!("Download of {} failed: {}", match_key, e);
                let message = download_failure_message(&e);
                state.notice = Some(Notice::error(message.clone()));
                state
                    .downloads
                    .insert(match_key.to_string(), DownloadState::Failed(message));
                Err(e)
            }
        }
    }

    pub async fn snapshot(&self) -> IngestSnapshot {
        let state = self.state.lock().await;
        IngestSnapshot {
            search: state.search.clone(),
            query: state.query.clone(),
            matches: state.matches.clone(),
            downloads: state.downloads.clone(),
            notice: state.notice.clone(),
        }
    }

    /// Dismiss the current notice.
    pub async fn clear_notice(&self) {
        self.state.lock().await.notice = None;
    }
}
