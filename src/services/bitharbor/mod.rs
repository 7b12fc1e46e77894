//! Type-routed (BitHarbor) backend adapter.
//!
//! Every media type lives under its own route segment (`/movies`, `/tv`,
//! ...). Operations without a type fan out over all six routes
//! concurrently and merge what answers; types that fail are reported in
//! the result's `failures` instead of failing the whole call.

mod fanout;
pub mod normalize;
pub mod types;

pub use fanout::{fan_out, FanOut};
pub use normalize::{detail_from_record, transform_media_item};
pub use types::{
    Admin, CastEntry, CastMember, CrewMember, FlatMetadata, IngestRequest, IngestResponse,
    ListRecord, MediaDetail, MediaDetailBody, MovieMetadata, MusicTrackMetadata,
    PodcastEpisodeMetadata, TvEpisodeMetadata, TvShowMetadata,
};

use crate::models::catalog::{
    CatalogDownloadRequest, CatalogDownloadResult, CatalogSearchOptions, CatalogSearchResponse,
};
use crate::models::media::{
    MediaItem, MediaPage, MediaType, Pagination, ScoredItem, SearchResults, SourceType,
};
use crate::services::search::{clamp_k, merge_top_k, normalize_hits, SearchResponse};
use crate::services::session::AuthenticatedUser;
use crate::services::transport::{ApiClient, ApiRequest};
use crate::Result;
use tracing::{debug, info, instrument, warn};
use types::{AuthResponse, LoginRequest, MeResponse, SearchRequest, SetupRequest};

/// Options for the keyword search over already-ingested media.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalSearchOptions {
    pub limit: usize,
    pub min_score: f32,
}

impl Default for LocalSearchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            min_score: 0.2,
        }
    }
}

/// Adapter for the type-routed backend.
#[derive(Clone)]
pub struct BitHarborAdapter {
    api: ApiClient,
}

impl BitHarborAdapter {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Log in as an administrator.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser> {
        let request = ApiRequest::post("/auth/login")
            .public()
            .json(&LoginRequest { email, password })?;
        let resp: AuthResponse = self.api.fetch_json(request).await?;
        info!("Logged in as {}", resp.admin.email);
        Ok(Self::user_from(resp))
    }

    /// Create the first administrator account.
    #[instrument(skip(self, password))]
    pub async fn setup(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthenticatedUser> {
        let request = ApiRequest::post("/auth/setup").public().json(&SetupRequest {
            email,
            password,
            display_name,
        })?;
        let resp: AuthResponse = self.api.fetch_json(request).await?;
        info!("Created administrator {}", resp.admin.email);
        Ok(Self::user_from(resp))
    }

    /// The administrator the session belongs to.
    pub async fn me(&self) -> Result<Admin> {
        let resp: MeResponse = self.api.fetch_json(ApiRequest::get("/auth/me")).await?;
        Ok(resp.admin)
    }

    fn user_from(resp: AuthResponse) -> AuthenticatedUser {
        AuthenticatedUser {
            user_name: resp.admin.display(),
            user_id: resp.admin.admin_id,
            access_token: resp.access_token,
        }
    }

    /// Check `/healthz` on the server origin.
    pub async fn health_check(&self) -> bool {
        let origin = self.api.base_url().replace("/api/v1", "");
        let probe = self.api.with_base_url(origin);
        match probe.execute(ApiRequest::get("/healthz").public()).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Health check failed: {}", e);
                false
            }
        }
    }

    /// Every item of one type.
    pub async fn list_type(&self, media_type: MediaType) -> Result<Vec<MediaItem>> {
        let path = format!("/{}/all", media_type.route());
        let records: Vec<ListRecord> = self.api.fetch_json(ApiRequest::get(path)).await?;
        debug!("{} {} records", records.len(), media_type);
        Ok(records
            .into_iter()
            .map(|r| transform_media_item(detail_from_record(r, media_type), media_type))
            .collect())
    }

    /// List media of one type, or of every type when `media_type` is `None`.
    ///
    /// The backend does not paginate; `pagination` is applied to the
    /// fetched list and `total_count` is always the full count.
    pub async fn get_media(
        &self,
        media_type: Option<MediaType>,
        pagination: Pagination,
    ) -> Result<MediaPage> {
        let (items, failures) = match media_type {
            Some(t) => (self.list_type(t).await?, Vec::new()),
            None => {
                let outcome = fan_out("list media", |t| self.list_type(t)).await?;
                let items: Vec<MediaItem> = outcome
                    .successes
                    .into_iter()
                    .flat_map(|(_, items)| items)
                    .collect();
                (items, outcome.failures)
            }
        };

        let total_count = items.len();
        Ok(MediaPage {
            items: pagination.apply(items),
            total_count,
            failures,
        })
    }

    async fn get_one(&self, media_id: &str, media_type: MediaType) -> Result<Option<MediaItem>> {
        let path = format!(
            "/{}/media/{}",
            media_type.route(),
            urlencoding::encode(media_id)
        );
        match self.api.fetch_json::<MediaDetail>(ApiRequest::get(path)).await {
            Ok(detail) => Ok(Some(transform_media_item(detail, media_type))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Look up one item.
    ///
    /// Without a type, the routes are probed one at a time in
    /// [`MediaType::ALL`] order until one has the item. A route that fails
    /// counts as a miss.
    pub async fn get_media_by_id(
        &self,
        media_id: &str,
        media_type: Option<MediaType>,
    ) -> Result<Option<MediaItem>> {
        if let Some(t) = media_type {
            return self.get_one(media_id, t).await;
        }

        for t in MediaType::ALL {
            match self.get_one(media_id, t).await {
                Ok(Some(item)) => return Ok(Some(item)),
                Ok(None) => continue,
                Err(e) => {
                    debug!("Probe of {} for {} failed: {}", t, media_id, e);
                    continue;
                }
            }
        }
        Ok(None)
    }

    async fn vector_search_type(
        &self,
        query: &str,
        media_type: MediaType,
        k: usize,
    ) -> Result<Vec<ScoredItem>> {
        let path = format!("/{}/search", media_type.route());
        let request = ApiRequest::post(path).json(&SearchRequest { query, k })?;
        let resp: SearchResponse = self.api.fetch_json(request).await?;
        Ok(normalize_hits(resp.results, media_type))
    }

    /// Semantic search. Without a type, every type is searched and the
    /// results merged into one top-`k` list sorted by score.
    #[instrument(skip(self))]
    pub async fn vector_search(
        &self,
        query: &str,
        media_type: Option<MediaType>,
        k: Option<usize>,
    ) -> Result<SearchResults> {
        let k = clamp_k(k);
        match media_type {
            Some(t) => Ok(SearchResults {
                results: self.vector_search_type(query, t, k).await?,
                failures: Vec::new(),
            }),
            None => {
                let outcome =
                    fan_out("vector search", |t| self.vector_search_type(query, t, k)).await?;
                let per_type = outcome.successes.into_iter().map(|(_, r)| r).collect();
                Ok(SearchResults {
                    results: merge_top_k(per_type, k),
                    failures: outcome.failures,
                })
            }
        }
    }

    async fn local_search_type(
        &self,
        query: &str,
        media_type: MediaType,
        options: LocalSearchOptions,
    ) -> Result<Vec<ScoredItem>> {
        let path = format!("/{}/local/search", media_type.route());
        let request = ApiRequest::get(path)
            .query("query", query)
            .query("limit", options.limit)
            .query("min_score", options.min_score);
        let resp: SearchResponse = self.api.fetch_json(request).await?;
        Ok(normalize_hits(resp.results, media_type))
    }

    /// Quick keyword search over ingested media, as used for suggestions.
    pub async fn local_search(
        &self,
        query: &str,
        media_type: Option<MediaType>,
        options: LocalSearchOptions,
    ) -> Result<SearchResults> {
        match media_type {
            Some(t) => Ok(SearchResults {
                results: self.local_search_type(query, t, options).await?,
                failures: Vec::new(),
            }),
            None => {
                let outcome =
                    fan_out("local search", |t| self.local_search_type(query, t, options)).await?;
                let per_type = outcome.successes.into_iter().map(|(_, r)| r).collect();
                Ok(SearchResults {
                    results: merge_top_k(per_type, options.limit),
                    failures: outcome.failures,
                })
            }
        }
    }

    /// Search the upstream catalog for titles not yet ingested.
    #[instrument(skip(self, options))]
    pub async fn search_catalog(
        &self,
        media_type: MediaType,
        query: &str,
        options: &CatalogSearchOptions,
    ) -> Result<CatalogSearchResponse> {
        let path = format!("/{}/catalog/search", media_type.route());
        let request = ApiRequest::get(path)
            .query("query", query)
            .query("limit", options.limit)
            .query_opt("year", options.year);
        let resp: CatalogSearchResponse = self.api.fetch_json(request).await?;
        info!("Catalog returned {} matches", resp.matches.len());
        Ok(resp)
    }

    /// Plan or execute the download of a catalog match.
    #[instrument(skip(self, request), fields(match_key = %request.match_key))]
    pub async fn download_catalog(
        &self,
        media_type: MediaType,
        request: &CatalogDownloadRequest,
    ) -> Result<CatalogDownloadResult> {
        let path = format!("/{}/catalog/download", media_type.route());
        let result: CatalogDownloadResult = self
            .api
            .fetch_json(ApiRequest::post(path).json(request)?)
            .await?;
        if result.downloaded {
            info!("Downloaded {}", result.title);
        } else {
            info!("Planned download of {}", result.title);
        }
        Ok(result)
    }

    pub async fn search_catalog_movies(
        &self,
        query: &str,
        options: &CatalogSearchOptions,
    ) -> Result<CatalogSearchResponse> {
        self.search_catalog(MediaType::Movie, query, options).await
    }

    pub async fn download_catalog_movie(
        &self,
        request: &CatalogDownloadRequest,
    ) -> Result<CatalogDownloadResult> {
        self.download_catalog(MediaType::Movie, request).await
    }

    /// Ingest a file already present on the server.
    #[instrument(skip(self, metadata))]
    pub async fn ingest_media(
        &self,
        media_type: MediaType,
        path: &str,
        source_type: SourceType,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
        poster_path: Option<&str>,
    ) -> Result<IngestResponse> {
        let body = IngestRequest {
            path: path.to_string(),
            source_type,
            metadata: metadata.unwrap_or_default(),
            poster_path: poster_path.map(|p| p.to_string()),
        };
        let route = format!("/{}/ingest/start", media_type.route());
        let resp: IngestResponse = self
            .api
            .fetch_json(ApiRequest::post(route).json(&body)?)
            .await?;
        info!("Ingested {} as {}", path, resp.media_id);
        Ok(resp)
    }

    /// Stream URL of an item. Without a type, the movie route is assumed.
    pub fn stream_url(&self, media_id: &str, media_type: Option<MediaType>) -> String {
        let media_type = media_type.unwrap_or_else(|| {
            warn!("Stream URL requested without a media type, assuming movie");
            MediaType::Movie
        });
        self.api
            .url_for(&format!(
                "/{}/media/{}/stream",
                media_type.route(),
                urlencoding::encode(media_id)
            ))
    }

    /// Stream URL addressed by file hash.
    pub fn stream_url_by_hash(&self, media_type: MediaType, file_hash: &str) -> String {
        format!(
            "{}?file_hash={}",
            self.api.url_for(&format!("/{}/stream", media_type.route())),
            urlencoding::encode(file_hash)
        )
    }
}
