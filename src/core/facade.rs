//! Backend-agnostic client.
//!
//! The backend is chosen once, at construction, from the configuration.
//! Browse and mutation calls never fail: a backend that lacks a feature
//! answers with an empty result or `false`, and transport errors are
//! logged and degraded the same way.

use crate::core::ingest::CatalogService;
use crate::models::catalog::{
    CatalogDownloadRequest, CatalogDownloadResult, CatalogSearchOptions, CatalogSearchResponse,
};
use crate::models::config::{BackendKind, Config};
use crate::models::media::{
    Library, MediaItem, MediaPage, MediaType, PagedItems, Pagination, ScoredItem, SearchResults,
};
use crate::services::bitharbor::BitHarborAdapter;
use crate::services::legacy::{LegacyAdapter, LibraryQuery};
use crate::services::mock::MockServer;
use crate::services::session::{AuthenticatedUser, Session, SessionData};
use crate::services::transport::{ApiClient, HttpTransport, Transport};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Id of the single virtual library exposed by the type-routed backend.
pub const ALL_MEDIA_LIBRARY_ID: &str = "all-media";

/// Page size used when a type-routed library listing gives no limit.
const DEFAULT_PAGE_SIZE: usize = 50;

/// The active backend adapter.
#[derive(Clone)]
pub enum Backend {
    /// Ticks-based adapter over the in-process mock server.
    Mock(LegacyAdapter),
    Legacy(LegacyAdapter),
    BitHarbor(BitHarborAdapter),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Mock(_) => BackendKind::Mock,
            Backend::Legacy(_) => BackendKind::Legacy,
            Backend::BitHarbor(_) => BackendKind::BitHarbor,
        }
    }

    fn legacy(&self) -> Option<&LegacyAdapter> {
        match self {
            Backend::Mock(adapter) | Backend::Legacy(adapter) => Some(adapter),
            Backend::BitHarbor(_) => None,
        }
    }
}

/// Single entry point over whichever backend is configured.
#[derive(Clone)]
pub struct UnifiedClient {
    backend: Backend,
    session: Arc<Session>,
}

impl UnifiedClient {
    pub fn new(backend: Backend, session: Arc<Session>) -> Self {
        Self { backend, session }
    }

    /// Build the configured backend with a real HTTP transport, or the
    /// in-process mock server for the mock backend.
    pub fn from_config(config: &Config, session: Arc<Session>) -> Result<Self> {
        let transport: Arc<dyn Transport> = match config.backend {
            BackendKind::Mock => Arc::new(MockServer::legacy()),
            BackendKind::Legacy | BackendKind::BitHarbor => Arc::new(HttpTransport::new(
                Duration::from_secs(config.timeout_secs),
                &config.user_agent,
            )?),
        };
        info!(
            "Using {} backend at {}",
            config.backend,
            config.active_base_url()
        );
        Ok(Self::with_transport(
            config.backend,
            config.active_base_url(),
            transport,
            session,
        ))
    }

    /// Build a backend of `kind` over an explicit transport.
    pub fn with_transport(
        kind: BackendKind,
        base_url: &str,
        transport: Arc<dyn Transport>,
        session: Arc<Session>,
    ) -> Self {
        let api = ApiClient::new(base_url, transport, session.clone());
        let backend = match kind {
            BackendKind::Mock => Backend::Mock(LegacyAdapter::new(api)),
            BackendKind::Legacy => Backend::Legacy(LegacyAdapter::new(api)),
            BackendKind::BitHarbor => Backend::BitHarbor(BitHarborAdapter::new(api)),
        };
        Self::new(backend, session)
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Log in and store the credentials in the session.
    ///
    /// `username` is the email address on the type-routed backend.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionData> {
        let user: AuthenticatedUser = match &self.backend {
            Backend::Mock(adapter) | Backend::Legacy(adapter) => {
                adapter.authenticate(username, password).await?
            }
            Backend::BitHarbor(adapter) => adapter.login(username, password).await?,
        };
        let data = user.into_session(self.backend_kind());
        self.session.set(data.clone());
        Ok(data)
    }

    /// Forget the current session.
    pub fn logout(&self) {
        self.session.clear();
        info!("Logged out");
    }

    pub async fn health_check(&self) -> bool {
        match &self.backend {
            Backend::Mock(adapter) | Backend::Legacy(adapter) => adapter.health_check().await,
            Backend::BitHarbor(adapter) => adapter.health_check().await,
        }
    }

    /// Search by text: semantic search on the type-routed backend, keyword
    /// search otherwise.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<MediaItem> {
        match &self.backend {
            Backend::Mock(adapter) | Backend::Legacy(adapter) => adapter.search(query, limit).await,
            Backend::BitHarbor(_) => self.vector_search(query, None, Some(limit)).await.items(),
        }
    }

    /// Scored search. Keyword results from the ticks-based backend all
    /// score 1.0.
    pub async fn vector_search(
        &self,
        query: &str,
        media_type: Option<MediaType>,
        k: Option<usize>,
    ) -> SearchResults {
        match &self.backend {
            Backend::Mock(adapter) | Backend::Legacy(adapter) => {
                let limit = crate::services::search::clamp_k(k);
                let results = adapter
                    .search(query, limit)
                    .await
                    .into_iter()
                    .map(|item| ScoredItem { item, score: 1.0 })
                    .collect();
                SearchResults {
                    results,
                    failures: Vec::new(),
                }
            }
            Backend::BitHarbor(adapter) => adapter
                .vector_search(query, media_type, k)
                .await
                .unwrap_or_else(|e| {
                    warn!("Vector search failed: {}", e);
                    SearchResults::default()
                }),
        }
    }

    /// Libraries. The type-routed backend has a single virtual one.
    pub async fn get_libraries(&self) -> Vec<Library> {
        match &self.backend {
            Backend::Mock(adapter) | Backend::Legacy(adapter) => adapter.get_libraries().await,
            Backend::BitHarbor(_) => vec![Library {
                id: ALL_MEDIA_LIBRARY_ID.to_string(),
                name: "All Media".to_string(),
                collection_type: Some("mixed".to_string()),
            }],
        }
    }

    /// Items of a library.
    ///
    /// On the type-routed backend the library id may also name a media
    /// type; anything else lists every type.
    pub async fn get_library_items(&self, library_id: &str, query: &LibraryQuery) -> PagedItems {
        match &self.backend {
            Backend::Mock(adapter) | Backend::Legacy(adapter) => {
                adapter.get_library_items(library_id, query).await
            }
            Backend::BitHarbor(_) => {
                let media_type = library_id.parse::<MediaType>().ok();
                let pagination = Pagination::new(
                    Some(query.limit.unwrap_or(DEFAULT_PAGE_SIZE)),
                    query.start_index.unwrap_or(0),
                );
                let page = self.get_media(media_type, pagination).await;
                PagedItems {
                    items: page.items,
                    total_count: page.total_count,
                }
            }
        }
    }

    /// Media listing with per-type failures. Only the type-routed backend
    /// lists by type; the others answer with an empty page.
    pub async fn get_media(&self, media_type: Option<MediaType>, pagination: Pagination) -> MediaPage {
        match &self.backend {
            Backend::BitHarbor(adapter) => adapter
                .get_media(media_type, pagination)
                .await
                .unwrap_or_else(|e| {
                    warn!("Failed to list media: {}", e);
                    MediaPage::default()
                }),
            _ => {
                debug!("Typed listing is not available on the {} backend", self.backend_kind());
                MediaPage::default()
            }
        }
    }

    pub async fn get_item_by_id(
        &self,
        item_id: &str,
        media_type: Option<MediaType>,
    ) -> Option<MediaItem> {
        match &self.backend {
            Backend::Mock(adapter) | Backend::Legacy(adapter) => {
                adapter.get_item_by_id(item_id).await
            }
            Backend::BitHarbor(adapter) => adapter
                .get_media_by_id(item_id, media_type)
                .await
                .unwrap_or_else(|e| {
                    warn!("Failed to fetch item {}: {}", item_id, e);
                    None
                }),
        }
    }

    /// Items to resume. The type-routed backend tracks no playback, so it
    /// answers with its first items instead.
    pub async fn get_continue_watching(&self, limit: usize) -> Vec<MediaItem> {
        match &self.backend {
            Backend::Mock(adapter) | Backend::Legacy(adapter) => {
                adapter.get_continue_watching(limit).await
            }
            Backend::BitHarbor(_) => self.get_media(None, Pagination::new(Some(limit), 0)).await.items,
        }
    }

    pub async fn get_recently_added(&self, limit: usize) -> Vec<MediaItem> {
        match &self.backend {
            Backend::Mock(adapter) | Backend::Legacy(adapter) => {
                adapter.get_recently_added(limit).await
            }
            Backend::BitHarbor(_) => self.get_media(None, Pagination::new(Some(limit), 0)).await.items,
        }
    }

    pub async fn get_favorites(&self, limit: usize) -> Vec<MediaItem> {
        match self.backend.legacy() {
            Some(adapter) => adapter.get_favorites(limit).await,
            None => Vec::new(),
        }
    }

    pub async fn toggle_favorite(&self, item_id: &str, is_favorite: bool) -> bool {
        match self.backend.legacy() {
            Some(adapter) => adapter.toggle_favorite(item_id, is_favorite).await,
            None => {
                warn!("Favorites are not supported by the {} backend", self.backend_kind());
                false
            }
        }
    }

    pub async fn report_playback_progress(
        &self,
        item_id: &str,
        position_seconds: u64,
        is_paused: bool,
    ) -> bool {
        match self.backend.legacy() {
            Some(adapter) => {
                adapter
                    .report_playback_progress(item_id, position_seconds, is_paused)
                    .await
            }
            None => {
                debug!("Playback tracking is not supported by the {} backend", self.backend_kind());
                false
            }
        }
    }

    pub async fn report_playback_stopped(&self, item_id: &str, position_seconds: u64) -> bool {
        match self.backend.legacy() {
            Some(adapter) => adapter.report_playback_stopped(item_id, position_seconds).await,
            None => false,
        }
    }

    pub async fn mark_as_played(&self, item_id: &str) -> bool {
        match self.backend.legacy() {
            Some(adapter) => adapter.mark_as_played(item_id).await,
            None => false,
        }
    }

    /// Image URL, when the backend serves item images.
    pub fn image_url(&self, item_id: &str, image_type: &str, width: Option<u32>) -> Option<String> {
        self.backend
            .legacy()
            .map(|adapter| adapter.image_url(item_id, image_type, width))
    }

    pub fn stream_url(&self, item_id: &str, media_type: Option<MediaType>) -> String {
        match &self.backend {
            Backend::Mock(adapter) | Backend::Legacy(adapter) => adapter.stream_url(item_id),
            Backend::BitHarbor(adapter) => adapter.stream_url(item_id, media_type),
        }
    }

    fn bitharbor(&self, operation: &'static str) -> Result<&BitHarborAdapter> {
        match &self.backend {
            Backend::BitHarbor(adapter) => Ok(adapter),
            other => Err(Error::Unsupported {
                backend: other.kind().as_str(),
                operation,
            }),
        }
    }

    /// The type-routed adapter, for operations only it offers (ingest,
    /// local search, account setup).
    pub fn type_routed(&self) -> Result<&BitHarborAdapter> {
        self.bitharbor("This operation")
    }
}

#[async_trait]
impl CatalogService for BitHarborAdapter {
    async fn search_catalog(
        &self,
        media_type: MediaType,
        query: &str,
        options: &CatalogSearchOptions,
    ) -> Result<CatalogSearchResponse> {
        BitHarborAdapter::search_catalog(self, media_type, query, options).await
    }

    async fn download_catalog(
        &self,
        media_type: MediaType,
        request: &CatalogDownloadRequest,
    ) -> Result<CatalogDownloadResult> {
        BitHarborAdapter::download_catalog(self, media_type, request).await
    }
}

#[async_trait]
impl CatalogService for UnifiedClient {
    async fn search_catalog(
        &self,
        media_type: MediaType,
        query: &str,
        options: &CatalogSearchOptions,
    ) -> Result<CatalogSearchResponse> {
        self.bitharbor("Catalog search")?
            .search_catalog(media_type, query, options)
            .await
    }

    async fn download_catalog(
        &self,
        media_type: MediaType,
        request: &CatalogDownloadRequest,
    ) -> Result<CatalogDownloadResult> {
        self.bitharbor("Catalog download")?
            .download_catalog(media_type, request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(kind: BackendKind) -> UnifiedClient {
        UnifiedClient::with_transport(
            kind,
            "http://localhost:8080/api/v1",
            Arc::new(MockServer::new()),
            Arc::new(Session::new()),
        )
    }

    #[tokio::test]
    async fn test_type_routed_has_one_virtual_library() {
        let libraries = client(BackendKind::BitHarbor).get_libraries().await;
        assert_eq!(libraries.len(), 1);
        assert_eq!(libraries[0].id, ALL_MEDIA_LIBRARY_ID);
    }

    #[tokio::test]
    async fn test_unsupported_features_degrade() {
        let client = client(BackendKind::BitHarbor);
        assert!(client.get_favorites(10).await.is_empty());
        assert!(!client.toggle_favorite("x", false).await);
        assert!(!client.mark_as_played("x").await);
        assert!(client.image_url("x", "Primary", None).is_none());
    }

    #[tokio::test]
    async fn test_catalog_unsupported_on_legacy() {
        let client = client(BackendKind::Legacy);
        let result = client
            .search_catalog(MediaType::Movie, "Heat", &CatalogSearchOptions::default())
            .await;
        match result {
            Err(Error::Unsupported { backend, .. }) => assert_eq!(backend, "legacy"),
            other => panic!("Expected Unsupported, got {:?}", other),
        }
    }
}
