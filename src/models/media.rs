//! Canonical media model shared by every backend adapter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Placeholder name for items that carry neither a title nor a path.
pub const UNTITLED: &str = "Untitled";

/// Media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
    Music,
    Podcast,
    Video,
    Personal,
}

impl MediaType {
    /// Every media type, in the fixed order used for fan-out and probing.
    pub const ALL: [MediaType; 6] = [
        MediaType::Movie,
        MediaType::Tv,
        MediaType::Music,
        MediaType::Podcast,
        MediaType::Video,
        MediaType::Personal,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
            MediaType::Music => "music",
            MediaType::Podcast => "podcast",
            MediaType::Video => "video",
            MediaType::Personal => "personal",
        }
    }

    /// Route segment used by the type-routed backend.
    pub fn route(&self) -> &'static str {
        match self {
            MediaType::Movie => "movies",
            MediaType::Tv => "tv",
            MediaType::Music => "music",
            MediaType::Podcast => "podcasts",
            MediaType::Video => "videos",
            MediaType::Personal => "personal",
        }
    }

    /// Human-readable plural label.
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Movie => "Movies",
            MediaType::Tv => "TV Shows",
            MediaType::Music => "Music",
            MediaType::Podcast => "Podcasts",
            MediaType::Video => "Videos",
            MediaType::Personal => "Personal Media",
        }
    }

    /// Resolve a backend-reported type name, coercing anything unknown to
    /// `fallback`.
    ///
    /// Accepts the canonical names, the type-routed route segments and the
    /// item kinds of the ticks-based schema (`Series`, `Episode`, `Audio`...).
    pub fn from_backend(raw: Option<&str>, fallback: MediaType) -> MediaType {
        let Some(raw) = raw else {
            return fallback;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" | "boxset" => MediaType::Movie,
            "tv" | "tv_show" | "tv_episode" | "series" | "season" | "episode" | "tvshows" => {
                MediaType::Tv
            }
            "music" | "audio" | "musicalbum" | "musicartist" => MediaType::Music,
            "podcast" | "podcasts" | "audiobook" => MediaType::Podcast,
            "video" | "videos" | "musicvideo" | "trailer" => MediaType::Video,
            "personal" | "photo" | "photoalbum" | "homevideos" => MediaType::Personal,
            _ => fallback,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            "music" => Ok(MediaType::Music),
            "podcast" | "podcasts" => Ok(MediaType::Podcast),
            "video" | "videos" => Ok(MediaType::Video),
            "personal" => Ok(MediaType::Personal),
            other => Err(crate::Error::validation(format!(
                "Unknown media type: {}",
                other
            ))),
        }
    }
}

/// Where an item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Commercial catalog title (movies, TV).
    Catalog,
    /// Personal/home media.
    Home,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Catalog => "catalog",
            SourceType::Home => "home",
        }
    }
}

impl FromStr for SourceType {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "catalog" => Ok(SourceType::Catalog),
            "home" => Ok(SourceType::Home),
            other => Err(crate::Error::validation(format!(
                "Unknown source type: {}",
                other
            ))),
        }
    }
}

/// Per-user playback state. Always fully populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub playback_position_ticks: u64,
    pub is_favorite: bool,
    pub played: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub played_percentage: Option<f32>,
}

/// Movie-specific fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInfo {
    pub original_title: Option<String>,
    pub tagline: Option<String>,
    pub cast: Vec<String>,
    pub director: Option<String>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
}

/// TV-specific fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TvInfo {
    pub series_name: Option<String>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub air_date: Option<String>,
    pub cast: Vec<String>,
}

/// Music-specific fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicInfo {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub duration_seconds: Option<u64>,
}

/// Podcast-specific fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastInfo {
    pub show_name: Option<String>,
    pub pub_date: Option<String>,
    pub episode_title: Option<String>,
    pub duration_seconds: Option<u64>,
}

/// Personal-media fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub capture_date: Option<String>,
    pub device_make: Option<String>,
    pub device_model: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
    pub album_name: Option<String>,
}

/// Online-video fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub platform: Option<String>,
    pub channel_name: Option<String>,
    pub uploader: Option<String>,
}

/// Type-specific extension of a media item. At most one group per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaExtras {
    Movie(MovieInfo),
    Tv(TvInfo),
    Music(MusicInfo),
    Podcast(PodcastInfo),
    Personal(PersonalInfo),
    Video(VideoInfo),
}

impl MediaExtras {
    /// The media type this group belongs to.
    pub fn media_type(&self) -> MediaType {
        match self {
            MediaExtras::Movie(_) => MediaType::Movie,
            MediaExtras::Tv(_) => MediaType::Tv,
            MediaExtras::Music(_) => MediaType::Music,
            MediaExtras::Podcast(_) => MediaType::Podcast,
            MediaExtras::Personal(_) => MediaType::Personal,
            MediaExtras::Video(_) => MediaType::Video,
        }
    }
}

/// Backend-agnostic media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub source_type: Option<SourceType>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub production_year: Option<i32>,
    pub release_date: Option<String>,
    pub genres: Vec<String>,
    pub community_rating: Option<f32>,
    pub official_rating: Option<String>,
    pub runtime_ticks: Option<u64>,
    pub runtime_minutes: Option<u32>,
    pub extras: Option<MediaExtras>,
    pub user_data: UserData,
}

impl MediaItem {
    /// Create an item with identity fields set and everything else empty.
    ///
    /// Empty ids and names are replaced so the canonical invariants hold:
    /// the id by a synthesized placeholder, the name by [`UNTITLED`].
    pub fn new(id: impl Into<String>, name: impl Into<String>, media_type: MediaType) -> Self {
        let id = id.into();
        let name = name.into();
        Self {
            id: if id.trim().is_empty() {
                synthesize_id(media_type)
            } else {
                id
            },
            name: if name.trim().is_empty() {
                UNTITLED.to_string()
            } else {
                name
            },
            media_type,
            source_type: None,
            overview: None,
            poster_url: None,
            backdrop_url: None,
            production_year: None,
            release_date: None,
            genres: Vec::new(),
            community_rating: None,
            official_rating: None,
            runtime_ticks: None,
            runtime_minutes: None,
            extras: None,
            user_data: UserData::default(),
        }
    }

    /// Runtime in whole minutes, derived from ticks when not reported.
    pub fn runtime_in_minutes(&self) -> Option<u64> {
        self.runtime_minutes
            .map(u64::from)
            .or_else(|| self.runtime_ticks.map(crate::utils::ticks::ticks_to_minutes))
    }
}

/// Generate a placeholder id for an item the backend did not identify.
///
/// Every call yields a distinct value, so two unidentified results in the
/// same response never collide.
pub fn synthesize_id(media_type: MediaType) -> String {
    format!("{}-{}", media_type.as_str(), uuid::Uuid::new_v4().simple())
}

/// Pick the first non-blank candidate name, else derive one from the file
/// path, else [`UNTITLED`].
pub fn resolve_name<'a, I>(candidates: I, path: Option<&str>) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
        .or_else(|| path.and_then(name_from_path))
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Derive a display name from a file path (file stem).
pub fn name_from_path(path: &str) -> Option<String> {
    Path::new(path.trim())
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A library (top-level collection) exposed by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub id: String,
    pub name: String,
    pub collection_type: Option<String>,
}

/// A page of items plus the backend's total count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedItems {
    pub items: Vec<MediaItem>,
    pub total_count: usize,
}

/// Client-side pagination window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Pagination {
    pub fn new(limit: Option<usize>, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Apply the window to an already-fetched list.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

/// A media type whose request failed during a fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeFailure {
    pub media_type: MediaType,
    pub message: String,
}

/// Result of a listing, possibly aggregated over several media types.
///
/// `failures` lists the types whose request failed; their items are absent
/// from `items` and their counts from `total_count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPage {
    pub items: Vec<MediaItem>,
    pub total_count: usize,
    pub failures: Vec<TypeFailure>,
}

impl MediaPage {
    /// Whether every requested type answered.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A media item with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item: MediaItem,
    pub score: f32,
}

/// Scored search results, possibly aggregated over several media types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<ScoredItem>,
    pub failures: Vec<TypeFailure>,
}

impl SearchResults {
    pub fn items(&self) -> Vec<MediaItem> {
        self.results.iter().map(|r| r.item.clone()).collect()
    }

    pub fn scores(&self) -> Vec<f32> {
        self.results.iter().map(|r| r.score).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_mapping() {
        let routes: Vec<&str> = MediaType::ALL.iter().map(|t| t.route()).collect();
        assert_eq!(
            routes,
            vec!["movies", "tv", "music", "podcasts", "videos", "personal"]
        );
    }

    #[test]
    fn test_from_backend_coerces_unknown() {
        assert_eq!(
            MediaType::from_backend(Some("Series"), MediaType::Video),
            MediaType::Tv
        );
        assert_eq!(
            MediaType::from_backend(Some("Audio"), MediaType::Video),
            MediaType::Music
        );
        assert_eq!(
            MediaType::from_backend(Some("Hologram"), MediaType::Personal),
            MediaType::Personal
        );
        assert_eq!(MediaType::from_backend(None, MediaType::Movie), MediaType::Movie);
    }

    #[test]
    fn test_parse_media_type() {
        assert_eq!("movies".parse::<MediaType>().unwrap(), MediaType::Movie);
        assert_eq!("TV".parse::<MediaType>().unwrap(), MediaType::Tv);
        assert!("radio".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_new_item_fills_identity() {
        let item = MediaItem::new("", "  ", MediaType::Music);
        assert!(item.id.starts_with("music-"));
        assert_eq!(item.name, UNTITLED);
        assert_eq!(item.user_data, UserData::default());
    }

    #[test]
    fn test_resolve_name() {
        assert_eq!(resolve_name([None, Some(" Heat ")], None), "Heat");
        assert_eq!(
            resolve_name([Some("")], Some("/media/home/Beach Day.mp4")),
            "Beach Day"
        );
        assert_eq!(resolve_name([None], None), UNTITLED);
    }

    #[test]
    fn test_synthesized_ids_are_distinct() {
        let a = synthesize_id(MediaType::Video);
        let b = synthesize_id(MediaType::Video);
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_pagination_window() {
        let page = Pagination::new(Some(2), 1).apply(vec![1, 2, 3, 4]);
        assert_eq!(page, vec![2, 3]);
        let all = Pagination::default().apply(vec![1, 2]);
        assert_eq!(all, vec![1, 2]);
    }

    #[test]
    fn test_runtime_in_minutes_from_ticks() {
        let mut item = MediaItem::new("1", "Heat", MediaType::Movie);
        item.runtime_ticks = Some(crate::utils::ticks::minutes_to_ticks(170));
        assert_eq!(item.runtime_in_minutes(), Some(170));
    }
}
