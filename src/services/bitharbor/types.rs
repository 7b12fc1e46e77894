//! Wire types of the type-routed API.

use crate::models::catalog::ImageMetadata;
use crate::models::media::SourceType;
use serde::{Deserialize, Deserializer, Serialize};

/// Cast entry: either a bare name or a full credit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CastEntry {
    Name(String),
    Member(CastMember),
}

impl CastEntry {
    pub fn name(&self) -> &str {
        match self {
            CastEntry::Name(name) => name,
            CastEntry::Member(member) => &member.name,
        }
    }
}

/// Collect cast names, skipping blanks.
pub fn cast_names(cast: &Option<Vec<CastEntry>>) -> Option<Vec<String>> {
    cast.as_ref().map(|entries| {
        entries
            .iter()
            .map(|c| c.name().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect()
    })
}

/// Cast credit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    /// 0 = top billed.
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Crew credit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrewMember {
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

/// Enriched movie metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovieMetadata {
    pub tmdb_id: Option<u64>,
    pub imdb_id: Option<String>,
    pub title: String,
    pub original_title: Option<String>,
    pub tagline: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub year: Option<i32>,
    pub status: Option<String>,
    pub runtime_min: Option<u32>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
    pub genres: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub vote_average: Option<f32>,
    pub vote_count: Option<u32>,
    pub cast: Option<Vec<CastEntry>>,
    pub crew: Option<Vec<CrewMember>>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

impl MovieMetadata {
    /// Name of the first crew member credited as director.
    pub fn director(&self) -> Option<String> {
        self.crew
            .as_ref()?
            .iter()
            .find(|c| c.job.as_deref() == Some("Director"))
            .map(|c| c.name.clone())
    }
}

/// Enriched TV show metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TvShowMetadata {
    pub tmdb_id: Option<u64>,
    pub name: String,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    pub genres: Option<Vec<String>>,
    pub vote_average: Option<f32>,
    pub cast: Option<Vec<CastEntry>>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub networks: Option<Vec<String>>,
}

/// Enriched TV episode metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TvEpisodeMetadata {
    pub tmdb_id: Option<u64>,
    pub series_name: Option<String>,
    pub name: String,
    pub overview: Option<String>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub air_date: Option<String>,
    pub runtime_min: Option<u32>,
    pub vote_average: Option<f32>,
    pub cast: Option<Vec<CastEntry>>,
    pub still_url: Option<String>,
}

/// Enriched music track metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MusicTrackMetadata {
    pub musicbrainz_id: Option<String>,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub duration_s: Option<f64>,
    pub year: Option<i32>,
    pub genres: Option<Vec<String>>,
}

/// Enriched podcast episode metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PodcastEpisodeMetadata {
    pub guid: Option<String>,
    pub title: String,
    pub show_name: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
    pub duration_s: Option<f64>,
    pub image_url: Option<String>,
}

/// Type-specific enriched metadata. Exactly one kind per record.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaDetailBody {
    Movie(MovieMetadata),
    TvShow(TvShowMetadata),
    TvEpisode {
        episode: TvEpisodeMetadata,
        show: Option<TvShowMetadata>,
    },
    Music(MusicTrackMetadata),
    Podcast(PodcastEpisodeMetadata),
}

/// Enriched metadata envelope as sent on the wire: every kind optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EnrichedEnvelope {
    movie: Option<MovieMetadata>,
    tv_show: Option<TvShowMetadata>,
    tv_episode: Option<TvEpisodeMetadata>,
    music: Option<MusicTrackMetadata>,
    podcast: Option<PodcastEpisodeMetadata>,
}

impl EnrichedEnvelope {
    /// Collapse the envelope to one kind: movie, then episode (with its
    /// show), then show, then music, then podcast.
    fn into_body(self) -> Option<MediaDetailBody> {
        if let Some(movie) = self.movie {
            return Some(MediaDetailBody::Movie(movie));
        }
        if let Some(episode) = self.tv_episode {
            return Some(MediaDetailBody::TvEpisode {
                episode,
                show: self.tv_show,
            });
        }
        if let Some(show) = self.tv_show {
            return Some(MediaDetailBody::TvShow(show));
        }
        if let Some(music) = self.music {
            return Some(MediaDetailBody::Music(music));
        }
        self.podcast.map(MediaDetailBody::Podcast)
    }
}

fn deserialize_body<'de, D>(deserializer: D) -> Result<Option<MediaDetailBody>, D::Error>
where
    D: Deserializer<'de>,
{
    let envelope = Option::<EnrichedEnvelope>::deserialize(deserializer)?;
    Ok(envelope.and_then(EnrichedEnvelope::into_body))
}

/// Generic metadata fields shared by every media type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlatMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub year: Option<i32>,
    pub duration_seconds: Option<f64>,
    pub genres: Option<Vec<String>>,
    pub rating: Option<f32>,
    pub content_rating: Option<String>,
    pub path: Option<String>,
    // Movie
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub tagline: Option<String>,
    pub cast: Option<Vec<CastEntry>>,
    pub director: Option<String>,
    // TV
    pub series_name: Option<String>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub air_date: Option<String>,
    // Music
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    pub duration: Option<f64>,
    // Podcast
    pub show_name: Option<String>,
    pub pub_date: Option<String>,
    pub episode_title: Option<String>,
    // Personal
    pub capture_date: Option<String>,
    pub device_make: Option<String>,
    pub device_model: Option<String>,
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
    pub album_name: Option<String>,
    // Online video
    pub platform: Option<String>,
    pub channel_name: Option<String>,
    pub uploader: Option<String>,
}

/// Media detail record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MediaDetail {
    pub media_id: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub source_type: Option<String>,
    pub vector_hash: Option<String>,
    pub file_hash: Option<String>,
    pub path: Option<String>,
    pub metadata: Option<FlatMetadata>,
    #[serde(rename = "enriched_metadata", deserialize_with = "deserialize_body")]
    pub body: Option<MediaDetailBody>,
}

impl MediaDetail {
    /// Source type, ignoring values this client does not know.
    pub fn source(&self) -> Option<SourceType> {
        match self.source_type.as_deref() {
            Some("catalog") => Some(SourceType::Catalog),
            Some("home") => Some(SourceType::Home),
            _ => None,
        }
    }
}

/// Record returned by `GET /{route}/all`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListRecord {
    pub file_hash: Option<String>,
    pub media_id: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub source_type: Option<String>,
    pub embedding_hash: Option<String>,
    pub year: Option<i32>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub release_date: Option<String>,
    pub runtime_min: Option<u32>,
    pub vote_average: Option<f32>,
    pub vote_count: Option<u32>,
    pub genres: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub cast: Option<Vec<CastEntry>>,
    pub catalog_id: Option<String>,
    pub poster: Option<ImageMetadata>,
    pub backdrop: Option<ImageMetadata>,
    pub metadata: Option<FlatMetadata>,
    #[serde(rename = "enriched_metadata", deserialize_with = "deserialize_body")]
    pub body: Option<MediaDetailBody>,
}

/// Search request body.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub k: usize,
}

/// Ingest request body.
#[derive(Debug, Clone, Serialize)]
pub struct IngestRequest {
    pub path: String,
    pub source_type: SourceType,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
}

/// Ingest response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub media_id: String,
    pub file_hash: String,
    pub vector_hash: String,
}

/// Administrator account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub admin_id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Admin {
    /// Display name, else the local part of the email address.
    pub fn display(&self) -> String {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| n.to_string())
            .unwrap_or_else(|| {
                self.email
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SetupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub display_name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub access_token: String,
    pub admin: Admin,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeResponse {
    pub admin: Admin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_collapses_to_episode_with_show() {
        let detail: MediaDetail = serde_json::from_value(json!({
            "media_id": "e1",
            "type": "tv",
            "enriched_metadata": {
                "tv_show": { "name": "Dark" },
                "tv_episode": { "name": "Secrets", "season_number": 1, "episode_number": 1 }
            }
        }))
        .unwrap();

        match detail.body {
            Some(MediaDetailBody::TvEpisode { episode, show }) => {
                assert_eq!(episode.name, "Secrets");
                assert_eq!(show.unwrap().name, "Dark");
            }
            other => panic!("Expected TvEpisode, got {:?}", other),
        }
    }

    #[test]
    fn test_null_envelope() {
        let detail: MediaDetail =
            serde_json::from_value(json!({ "media_id": "x", "enriched_metadata": null })).unwrap();
        assert!(detail.body.is_none());

        let detail: MediaDetail = serde_json::from_value(json!({ "media_id": "x" })).unwrap();
        assert!(detail.body.is_none());
    }

    #[test]
    fn test_cast_accepts_names_and_credits() {
        let movie: MovieMetadata = serde_json::from_value(json!({
            "title": "Alien",
            "cast": ["Sigourney Weaver", { "name": "Tom Skerritt", "character": "Dallas" }],
            "crew": [{ "name": "Ridley Scott", "job": "Director", "department": "Directing" }]
        }))
        .unwrap();
        assert_eq!(
            cast_names(&movie.cast).unwrap(),
            vec!["Sigourney Weaver", "Tom Skerritt"]
        );
        assert_eq!(movie.director().as_deref(), Some("Ridley Scott"));
    }

    #[test]
    fn test_admin_display_falls_back_to_email() {
        let admin = Admin {
            admin_id: "a".to_string(),
            email: "root@harbor.local".to_string(),
            display_name: None,
        };
        assert_eq!(admin.display(), "root");
    }
}
