//! Ticks-based (Jellyfin-style) backend adapter.
//!
//! Listing calls never fail: a transport error is logged and an empty
//! result returned. Single-item lookups return `None` and mutations
//! return `false` on failure so callers can react.

use crate::models::catalog::year_of_date;
use crate::models::media::{
    resolve_name, Library, MediaExtras, MediaItem, MediaType, MovieInfo, MusicInfo, PagedItems,
    TvInfo, UserData,
};
use crate::services::session::AuthenticatedUser;
use crate::services::transport::{ApiClient, ApiRequest};
use crate::utils::ticks;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Item kinds requested when browsing a library.
const LIBRARY_ITEM_TYPES: &str = "Movie,Series,MusicAlbum";

/// Sort field for library listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    SortName,
    PremiereDate,
    CommunityRating,
    DateCreated,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::SortName => "SortName",
            SortBy::PremiereDate => "PremiereDate",
            SortBy::CommunityRating => "CommunityRating",
            SortBy::DateCreated => "DateCreated",
        }
    }
}

impl std::str::FromStr for SortBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "sortname" => Ok(SortBy::SortName),
            "year" | "premiere" | "premieredate" => Ok(SortBy::PremiereDate),
            "rating" | "communityrating" => Ok(SortBy::CommunityRating),
            "date-added" | "added" | "datecreated" => Ok(SortBy::DateCreated),
            other => Err(Error::validation(format!("Unknown sort field: {}", other))),
        }
    }
}

/// Sort direction for library listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "Ascending",
            SortOrder::Descending => "Descending",
        }
    }
}

/// Options for [`LegacyAdapter::get_library_items`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryQuery {
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
    pub genres: Vec<String>,
    pub limit: Option<usize>,
    pub start_index: Option<usize>,
}

/// Raw item as returned by the ticks-based API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LegacyItem {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub item_type: Option<String>,
    pub overview: Option<String>,
    pub path: Option<String>,
    pub production_year: Option<i32>,
    pub premiere_date: Option<String>,
    pub run_time_ticks: Option<u64>,
    pub official_rating: Option<String>,
    pub community_rating: Option<f32>,
    pub genres: Option<Vec<String>>,
    pub image_tags: Option<HashMap<String, String>>,
    pub backdrop_image_tags: Option<Vec<String>>,
    pub user_data: Option<LegacyUserData>,
    pub series_name: Option<String>,
    pub parent_index_number: Option<u32>,
    pub index_number: Option<u32>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub artists: Option<Vec<String>>,
    pub original_title: Option<String>,
    pub taglines: Option<Vec<String>>,
}

/// Raw per-user state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LegacyUserData {
    pub playback_position_ticks: Option<u64>,
    pub is_favorite: Option<bool>,
    pub played: Option<bool>,
    pub played_percentage: Option<f32>,
}

impl From<Option<LegacyUserData>> for UserData {
    fn from(raw: Option<LegacyUserData>) -> Self {
        let raw = raw.unwrap_or_default();
        UserData {
            playback_position_ticks: raw.playback_position_ticks.unwrap_or(0),
            is_favorite: raw.is_favorite.unwrap_or(false),
            played: raw.played.unwrap_or(false),
            played_percentage: raw.played_percentage.map(|p| p.clamp(0.0, 100.0)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ItemsResponse {
    items: Vec<LegacyItem>,
    total_record_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ViewItem {
    id: String,
    name: String,
    #[serde(default)]
    collection_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticateRequest<'a> {
    username: &'a str,
    pw: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticateResponse {
    user: AuthUser,
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthUser {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PlaybackReport<'a> {
    item_id: &'a str,
    position_ticks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_paused: Option<bool>,
}

/// Adapter for the ticks-based backend.
#[derive(Clone)]
pub struct LegacyAdapter {
    api: ApiClient,
    fallback_type: MediaType,
}

impl LegacyAdapter {
    /// Create an adapter; unrecognized item kinds become videos.
    pub fn new(api: ApiClient) -> Self {
        Self::with_fallback_type(api, MediaType::Video)
    }

    /// Create an adapter with a custom type for unrecognized item kinds.
    pub fn with_fallback_type(api: ApiClient, fallback_type: MediaType) -> Self {
        Self { api, fallback_type }
    }

    fn user_id(&self) -> Result<String> {
        self.api.session().user_id().ok_or(Error::NotAuthenticated)
    }

    /// Log in with username and password.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<AuthenticatedUser> {
        let request = ApiRequest::post("/Users/AuthenticateByName")
            .public()
            .json(&AuthenticateRequest {
                username,
                pw: password,
            })?;
        let resp: AuthenticateResponse = self.api.fetch_json(request).await?;
        info!("Authenticated as {}", resp.user.name);
        Ok(AuthenticatedUser {
            user_id: resp.user.id,
            user_name: resp.user.name,
            access_token: resp.access_token,
        })
    }

    /// Check if the server is reachable.
    pub async fn health_check(&self) -> bool {
        let request = ApiRequest::get("/System/Info/Public").public();
        match self.api.execute(request).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Health check failed: {}", e);
                false
            }
        }
    }

    /// Top-level libraries of the current user.
    pub async fn get_libraries(&self) -> Vec<Library> {
        let result: Result<Vec<Library>> = async {
            let path = format!("/Users/{}/Views", self.user_id()?);
            let resp: ItemsResponseOf<ViewItem> = self.api.fetch_json(ApiRequest::get(path)).await?;
            Ok(resp
                .items
                .into_iter()
                .map(|v| Library {
                    id: v.id,
                    name: v.name,
                    collection_type: v.collection_type,
                })
                .collect())
        }
        .await;

        result.unwrap_or_else(|e| {
            warn!("Failed to fetch libraries: {}", e);
            Vec::new()
        })
    }

    /// Partially watched items.
    pub async fn get_continue_watching(&self, limit: usize) -> Vec<MediaItem> {
        let result: Result<Vec<MediaItem>> = async {
            let path = format!("/Users/{}/Items/Resume", self.user_id()?);
            let resp: ItemsResponse = self
                .api
                .fetch_json(ApiRequest::get(path).query("Limit", limit))
                .await?;
            Ok(self.normalize_all(resp.items))
        }
        .await;

        self.degrade_list("continue watching", result)
    }

    /// Latest additions. This endpoint answers with a bare array.
    pub async fn get_recently_added(&self, limit: usize) -> Vec<MediaItem> {
        let result: Result<Vec<MediaItem>> = async {
            let path = format!("/Users/{}/Items/Latest", self.user_id()?);
            let items: Vec<LegacyItem> = self
                .api
                .fetch_json(ApiRequest::get(path).query("Limit", limit))
                .await?;
            Ok(self.normalize_all(items))
        }
        .await;

        self.degrade_list("recently added", result)
    }

    /// Favorite items, sorted by name.
    pub async fn get_favorites(&self, limit: usize) -> Vec<MediaItem> {
        let result: Result<Vec<MediaItem>> = async {
            let path = format!("/Users/{}/Items", self.user_id()?);
            let request = ApiRequest::get(path)
                .query("Filters", "IsFavorite")
                .query("Recursive", "true")
                .query("Limit", limit)
                .query("SortBy", SortBy::SortName.as_str())
                .query("SortOrder", SortOrder::Ascending.as_str());
            let resp: ItemsResponse = self.api.fetch_json(request).await?;
            Ok(self.normalize_all(resp.items))
        }
        .await;

        self.degrade_list("favorites", result)
    }

    /// Items of one library.
    pub async fn get_library_items(&self, library_id: &str, query: &LibraryQuery) -> PagedItems {
        let result: Result<PagedItems> = async {
            let path = format!("/Users/{}/Items", self.user_id()?);
            let mut request = ApiRequest::get(path)
                .query("ParentId", library_id)
                .query("IncludeItemTypes", LIBRARY_ITEM_TYPES)
                .query("Recursive", "true")
                .query("Fields", "PrimaryImageAspectRatio,BasicSyncInfo,ProductionYear")
                .query("ImageTypeLimit", 1)
                .query("EnableImageTypes", "Primary,Backdrop,Thumb")
                .query_opt("SortBy", query.sort_by.map(|s| s.as_str()))
                .query_opt("SortOrder", query.sort_order.map(|s| s.as_str()))
                .query_opt("Limit", query.limit)
                .query_opt("StartIndex", query.start_index.filter(|&i| i > 0));
            if !query.genres.is_empty() {
                request = request.query("Genres", query.genres.join(","));
            }

            let resp: ItemsResponse = self.api.fetch_json(request).await?;
            let total_count = resp.total_record_count.unwrap_or(0);
            Ok(PagedItems {
                items: self.normalize_all(resp.items),
                total_count,
            })
        }
        .await;

        result.unwrap_or_else(|e| {
            warn!("Failed to fetch library items for {}: {}", library_id, e);
            PagedItems::default()
        })
    }

    /// Keyword search over the user's items.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<MediaItem> {
        let result: Result<Vec<MediaItem>> = async {
            let path = format!("/Users/{}/Items", self.user_id()?);
            let request = ApiRequest::get(path)
                .query("SearchTerm", query)
                .query("Recursive", "true")
                .query("Limit", limit);
            let resp: ItemsResponse = self.api.fetch_json(request).await?;
            Ok(self.normalize_all(resp.items))
        }
        .await;

        self.degrade_list("search", result)
    }

    /// One item, or `None` when missing or unreachable.
    pub async fn get_item_by_id(&self, item_id: &str) -> Option<MediaItem> {
        let result: Result<LegacyItem> = async {
            let path = format!("/Users/{}/Items/{}", self.user_id()?, segment(item_id));
            self.api.fetch_json(ApiRequest::get(path)).await
        }
        .await;

        match result {
            Ok(raw) => Some(self.normalize(raw)),
            Err(e) if e.is_not_found() => {
                debug!("Item {} not found", item_id);
                None
            }
            Err(e) => {
                warn!("Failed to fetch item {}: {}", item_id, e);
                None
            }
        }
    }

    /// Flip the favorite flag.
    ///
    /// `is_favorite` is the state the caller currently shows: `false` adds
    /// (POST), `true` removes (DELETE). Concurrent toggles are last write wins.
    pub async fn toggle_favorite(&self, item_id: &str, is_favorite: bool) -> bool {
        let result: Result<()> = async {
            let path = format!(
                "/Users/{}/FavoriteItems/{}",
                self.user_id()?,
                segment(item_id)
            );
            let request = if is_favorite {
                ApiRequest::delete(path)
            } else {
                ApiRequest::post(path)
            };
            self.api.execute_unit(request).await
        }
        .await;

        self.degrade_mutation("toggle favorite", result)
    }

    /// Report the playback position while playing.
    pub async fn report_playback_progress(
        &self,
        item_id: &str,
        position_seconds: u64,
        is_paused: bool,
    ) -> bool {
        let result: Result<()> = async {
            let request = ApiRequest::post("/Sessions/Playing/Progress").json(&PlaybackReport {
                item_id,
                position_ticks: position_to_ticks(position_seconds)?,
                is_paused: Some(is_paused),
            })?;
            self.api.execute_unit(request).await
        }
        .await;

        self.degrade_mutation("report playback progress", result)
    }

    /// Report the final position when playback stops.
    pub async fn report_playback_stopped(&self, item_id: &str, position_seconds: u64) -> bool {
        let result: Result<()> = async {
            let request = ApiRequest::post("/Sessions/Playing/Stopped").json(&PlaybackReport {
                item_id,
                position_ticks: position_to_ticks(position_seconds)?,
                is_paused: None,
            })?;
            self.api.execute_unit(request).await
        }
        .await;

        self.degrade_mutation("report playback stopped", result)
    }

    /// Mark an item as played.
    pub async fn mark_as_played(&self, item_id: &str) -> bool {
        let result: Result<()> = async {
            let path = format!(
                "/Users/{}/PlayedItems/{}",
                self.user_id()?,
                segment(item_id)
            );
            self.api.execute_unit(ApiRequest::post(path)).await
        }
        .await;

        self.degrade_mutation("mark as played", result)
    }

    /// URL of an item image.
    pub fn image_url(&self, item_id: &str, image_type: &str, width: Option<u32>) -> String {
        let url = self.api.url_for(&format!(
            "/Items/{}/Images/{}",
            segment(item_id),
            segment(image_type)
        ));
        match width {
            Some(w) => format!("{}?width={}&quality=90", url, w),
            None => url,
        }
    }

    /// Direct-play stream URL.
    pub fn stream_url(&self, item_id: &str) -> String {
        format!(
            "{}?static=true",
            self.api.url_for(&format!("/Videos/{}/stream", segment(item_id)))
        )
    }

    fn normalize_all(&self, items: Vec<LegacyItem>) -> Vec<MediaItem> {
        items.into_iter().map(|raw| self.normalize(raw)).collect()
    }

    /// Convert a raw item to the canonical model.
    pub fn normalize(&self, raw: LegacyItem) -> MediaItem {
        let media_type = MediaType::from_backend(raw.item_type.as_deref(), self.fallback_type);
        let name = resolve_name([raw.name.as_deref()], raw.path.as_deref());
        let mut item = MediaItem::new(raw.id.clone().unwrap_or_default(), name, media_type);

        let has_primary = raw
            .image_tags
            .as_ref()
            .map(|tags| tags.contains_key("Primary"))
            .unwrap_or(false);
        if has_primary {
            item.poster_url = Some(self.image_url(&item.id, "Primary", None));
        }
        if raw.backdrop_image_tags.as_ref().is_some_and(|t| !t.is_empty()) {
            item.backdrop_url = Some(self.image_url(&item.id, "Backdrop", None));
        }

        item.overview = raw.overview;
        item.production_year = raw
            .production_year
            .or_else(|| raw.premiere_date.as_deref().and_then(year_of_date));
        item.release_date = raw.premiere_date.clone();
        item.genres = raw.genres.unwrap_or_default();
        item.community_rating = raw.community_rating;
        item.official_rating = raw.official_rating;
        item.runtime_ticks = raw.run_time_ticks;
        item.runtime_minutes = raw
            .run_time_ticks
            .and_then(|t| u32::try_from(ticks::ticks_to_minutes(t)).ok());
        item.user_data = raw.user_data.into();

        item.extras = match media_type {
            MediaType::Movie => Some(MediaExtras::Movie(MovieInfo {
                original_title: raw.original_title,
                tagline: raw.taglines.and_then(|t| t.into_iter().next()),
                ..Default::default()
            })),
            MediaType::Tv => Some(MediaExtras::Tv(TvInfo {
                series_name: raw.series_name,
                season_number: raw.parent_index_number,
                episode_number: raw.index_number,
                air_date: raw.premiere_date,
                cast: Vec::new(),
            })),
            MediaType::Music => Some(MediaExtras::Music(MusicInfo {
                artist: raw
                    .artists
                    .and_then(|a| a.into_iter().next())
                    .or_else(|| raw.album_artist.clone()),
                album: raw.album,
                album_artist: raw.album_artist,
                track_number: raw.index_number,
                disc_number: raw.parent_index_number,
                duration_seconds: raw.run_time_ticks.map(ticks::ticks_to_seconds),
            })),
            _ => None,
        };

        item
    }

    fn degrade_list(&self, operation: &str, result: Result<Vec<MediaItem>>) -> Vec<MediaItem> {
        result.unwrap_or_else(|e| {
            warn!("Failed to fetch {}: {}", operation, e);
            Vec::new()
        })
    }

    fn degrade_mutation(&self, operation: &str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to {}: {}", operation, e);
                false
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponseOf<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

fn position_to_ticks(seconds: u64) -> Result<u64> {
    ticks::seconds_to_ticks(seconds)
        .ok_or_else(|| Error::validation(format!("Playback position out of range: {}s", seconds)))
}

/// Percent-encode a value used as one path segment.
fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::MockServer;
    use crate::services::session::Session;
    use std::sync::Arc;

    fn adapter() -> LegacyAdapter {
        let api = ApiClient::new(
            "http://jf:8096",
            Arc::new(MockServer::new()),
            Arc::new(Session::new()),
        );
        LegacyAdapter::new(api)
    }

    #[test]
    fn test_normalize_movie() {
        let raw: LegacyItem = serde_json::from_value(serde_json::json!({
            "Id": "m1",
            "Name": "Heat",
            "Type": "Movie",
            "RunTimeTicks": 102_000_000_000u64,
            "PremiereDate": "1995-12-15T00:00:00Z",
            "ImageTags": { "Primary": "abc" },
            "Genres": ["Crime"],
            "UserData": { "IsFavorite": true }
        }))
        .unwrap();

        let item = adapter().normalize(raw);
        assert_eq!(item.media_type, MediaType::Movie);
        assert_eq!(item.runtime_minutes, Some(170));
        assert_eq!(item.production_year, Some(1995));
        assert_eq!(
            item.poster_url.as_deref(),
            Some("http://jf:8096/Items/m1/Images/Primary")
        );
        assert!(item.user_data.is_favorite);
        assert!(!item.user_data.played);
        assert_eq!(item.user_data.playback_position_ticks, 0);
    }

    #[test]
    fn test_absurd_runtime_has_no_minutes() {
        let raw = LegacyItem {
            id: Some("m2".to_string()),
            item_type: Some("Movie".to_string()),
            run_time_ticks: Some(u64::MAX),
            ..Default::default()
        };
        let item = adapter().normalize(raw);
        assert_eq!(item.runtime_minutes, None);
        assert_eq!(item.runtime_ticks, Some(u64::MAX));
    }

    #[test]
    fn test_normalize_fills_missing_identity() {
        let raw = LegacyItem {
            item_type: Some("Photo".to_string()),
            path: Some("/photos/2021/IMG_0042.jpg".to_string()),
            ..Default::default()
        };
        let item = adapter().normalize(raw);
        assert!(!item.id.is_empty());
        assert_eq!(item.name, "IMG_0042");
        assert_eq!(item.media_type, MediaType::Personal);
    }

    #[test]
    fn test_unknown_kind_uses_fallback() {
        let raw = LegacyItem {
            id: Some("x".to_string()),
            name: Some("Thing".to_string()),
            item_type: Some("Folder".to_string()),
            ..Default::default()
        };
        assert_eq!(adapter().normalize(raw).media_type, MediaType::Video);
    }

    #[test]
    fn test_image_url_with_width() {
        assert_eq!(
            adapter().image_url("a", "Backdrop", Some(300)),
            "http://jf:8096/Items/a/Images/Backdrop?width=300&quality=90"
        );
    }
}
