//! Conversion of type-routed records into [`MediaItem`]s.
//!
//! Flat metadata provides the base item. Enriched metadata, when present
//! and of the item's kind, then overrides it field by field: an enriched
//! value wins only when it is present and non-blank.

use super::types::{
    cast_names, FlatMetadata, ListRecord, MediaDetail, MediaDetailBody, MovieMetadata,
    MusicTrackMetadata, PodcastEpisodeMetadata, TvEpisodeMetadata, TvShowMetadata,
};
use crate::models::catalog::year_of_date;
use crate::models::media::{
    resolve_name, MediaExtras, MediaItem, MediaType, MovieInfo, MusicInfo, PersonalInfo,
    PodcastInfo, TvInfo, VideoInfo,
};
use crate::utils::ticks::{fractional_seconds_to_ticks, minutes_to_ticks};

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn whole_seconds(seconds: Option<f64>) -> Option<u64> {
    seconds
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| s.round() as u64)
}

fn body_type(body: &MediaDetailBody) -> MediaType {
    match body {
        MediaDetailBody::Movie(_) => MediaType::Movie,
        MediaDetailBody::TvShow(_) | MediaDetailBody::TvEpisode { .. } => MediaType::Tv,
        MediaDetailBody::Music(_) => MediaType::Music,
        MediaDetailBody::Podcast(_) => MediaType::Podcast,
    }
}

/// Convert a media detail record into a canonical item.
///
/// `route_type` is the type of the endpoint that returned the record; it is
/// used when the record does not name a known type.
pub fn transform_media_item(detail: MediaDetail, route_type: MediaType) -> MediaItem {
    let media_type = MediaType::from_backend(detail.media_type.as_deref(), route_type);
    let source_type = detail.source();
    let flat = detail.metadata.unwrap_or_default();
    let path = detail.path.as_deref().or(flat.path.as_deref());

    let id = non_blank(detail.media_id)
        .or_else(|| non_blank(detail.file_hash))
        .unwrap_or_default();
    let name = resolve_name(
        [detail.title.as_deref(), flat.title.as_deref()],
        path,
    );

    let mut item = MediaItem::new(id, name, media_type);
    item.source_type = source_type;
    item.overview = non_blank(flat.description.clone()).or_else(|| non_blank(flat.overview.clone()));
    item.poster_url = non_blank(flat.poster_url.clone());
    item.backdrop_url = non_blank(flat.backdrop_url.clone());
    item.production_year = flat.year;
    item.release_date = non_blank(flat.release_date.clone());
    item.genres = flat.genres.clone().unwrap_or_default();
    item.community_rating = flat.rating;
    item.official_rating = non_blank(flat.content_rating.clone());
    item.runtime_minutes = flat.runtime_minutes;
    item.runtime_ticks = flat
        .duration_seconds
        .and_then(fractional_seconds_to_ticks)
        .or_else(|| flat.runtime_minutes.map(|m| minutes_to_ticks(u64::from(m))));

    match detail.body {
        Some(body) if body_type(&body) == media_type => apply_body(&mut item, body, &flat),
        Some(body) => {
            tracing::debug!(
                "Ignoring {} metadata on {} item {}",
                body_type(&body),
                media_type,
                item.id
            );
            item.extras = Some(flat_extras(media_type, &flat));
        }
        None => item.extras = Some(flat_extras(media_type, &flat)),
    }

    item
}

/// Convert a `/all` listing record into a media detail.
///
/// Records identify themselves by file hash first and default to catalog
/// sources. Movie records carry their enriched fields at the top level;
/// those become a movie body.
pub fn detail_from_record(record: ListRecord, media_type: MediaType) -> MediaDetail {
    let media_id = non_blank(record.file_hash.clone())
        .or_else(|| non_blank(record.media_id.clone()))
        .or_else(|| non_blank(record.id.clone()));
    let title = non_blank(record.title.clone()).or_else(|| non_blank(record.name.clone()));

    let mut flat = record.metadata.clone().unwrap_or_default();
    flat.title = flat.title.or_else(|| title.clone());
    flat.overview = flat.overview.or_else(|| record.overview.clone());
    flat.year = flat.year.or(record.year);
    flat.genres = flat.genres.or_else(|| record.genres.clone());
    flat.rating = flat.rating.or(record.vote_average);
    flat.release_date = flat.release_date.or_else(|| record.release_date.clone());
    flat.runtime_minutes = flat.runtime_minutes.or(record.runtime_min);
    flat.duration_seconds = flat
        .duration_seconds
        .or_else(|| record.runtime_min.map(|m| f64::from(m) * 60.0));
    flat.poster_url = flat
        .poster_url
        .or_else(|| record.poster.as_ref().map(|p| p.file_path.clone()));
    flat.backdrop_url = flat
        .backdrop_url
        .or_else(|| record.backdrop.as_ref().map(|b| b.file_path.clone()));

    let body = match record.body {
        Some(body) => Some(body),
        None if media_type == MediaType::Movie => Some(MediaDetailBody::Movie(MovieMetadata {
            tmdb_id: record.catalog_id.as_deref().and_then(|id| id.parse().ok()),
            title: title.clone().unwrap_or_default(),
            original_title: title.clone(),
            tagline: record.tagline,
            overview: record.overview,
            release_date: record.release_date,
            year: record.year,
            runtime_min: record.runtime_min,
            genres: record.genres,
            languages: record.languages,
            vote_average: record.vote_average,
            vote_count: record.vote_count,
            cast: record.cast,
            poster_url: record.poster.map(|p| p.file_path),
            backdrop_url: record.backdrop.map(|b| b.file_path),
            ..MovieMetadata::default()
        })),
        None => None,
    };

    MediaDetail {
        media_id,
        media_type: Some(media_type.as_str().to_string()),
        title,
        source_type: record.source_type.or_else(|| Some("catalog".to_string())),
        vector_hash: record.embedding_hash,
        file_hash: record.file_hash,
        path: record.path,
        metadata: Some(flat),
        body,
    }
}

fn apply_body(item: &mut MediaItem, body: MediaDetailBody, flat: &FlatMetadata) {
    match body {
        MediaDetailBody::Movie(movie) => apply_movie(item, movie, flat),
        MediaDetailBody::TvShow(show) => apply_tv(item, None, Some(show), flat),
        MediaDetailBody::TvEpisode { episode, show } => apply_tv(item, Some(episode), show, flat),
        MediaDetailBody::Music(track) => apply_music(item, track, flat),
        MediaDetailBody::Podcast(episode) => apply_podcast(item, episode, flat),
    }
}

fn apply_movie(item: &mut MediaItem, movie: MovieMetadata, flat: &FlatMetadata) {
    let director = movie.director().or_else(|| flat.director.clone());
    let cast = cast_names(&movie.cast)
        .or_else(|| cast_names(&flat.cast))
        .unwrap_or_default();

    if let Some(title) = non_blank(Some(movie.title)) {
        item.name = title;
    }
    item.overview = non_blank(movie.overview).or(item.overview.take());
    item.production_year = movie
        .year
        .or_else(|| movie.release_date.as_deref().and_then(year_of_date))
        .or(item.production_year);
    item.release_date = non_blank(movie.release_date).or(item.release_date.take());
    if let Some(minutes) = movie.runtime_min {
        item.runtime_minutes = Some(minutes);
        item.runtime_ticks = Some(minutes_to_ticks(u64::from(minutes)));
    }
    if let Some(genres) = movie.genres {
        item.genres = genres;
    }
    item.community_rating = movie.vote_average.or(item.community_rating);
    item.poster_url = non_blank(movie.poster_url).or(item.poster_url.take());
    item.backdrop_url = non_blank(movie.backdrop_url).or(item.backdrop_url.take());

    item.extras = Some(MediaExtras::Movie(MovieInfo {
        original_title: non_blank(movie.original_title).or_else(|| flat.original_title.clone()),
        tagline: non_blank(movie.tagline).or_else(|| flat.tagline.clone()),
        cast,
        director,
        budget: movie.budget,
        revenue: movie.revenue,
    }));
}

fn apply_tv(
    item: &mut MediaItem,
    episode: Option<TvEpisodeMetadata>,
    show: Option<TvShowMetadata>,
    flat: &FlatMetadata,
) {
    let show = show.unwrap_or_default();
    let series_name = episode
        .as_ref()
        .and_then(|e| non_blank(e.series_name.clone()))
        .or_else(|| non_blank(Some(show.name.clone())))
        .or_else(|| flat.series_name.clone());
    let cast = episode
        .as_ref()
        .and_then(|e| cast_names(&e.cast))
        .or_else(|| cast_names(&show.cast))
        .or_else(|| cast_names(&flat.cast))
        .unwrap_or_default();

    let title = match &episode {
        Some(e) => non_blank(Some(e.name.clone())),
        None => non_blank(Some(show.name.clone())),
    };
    if let Some(title) = title {
        item.name = title;
    }

    item.overview = episode
        .as_ref()
        .and_then(|e| non_blank(e.overview.clone()))
        .or_else(|| non_blank(show.overview.clone()))
        .or(item.overview.take());
    item.community_rating = episode
        .as_ref()
        .and_then(|e| e.vote_average)
        .or(show.vote_average)
        .or(item.community_rating);
    item.production_year = show
        .first_air_date
        .as_deref()
        .and_then(year_of_date)
        .or(item.production_year);
    if let Some(genres) = show.genres {
        item.genres = genres;
    }
    item.poster_url = non_blank(show.poster_url).or(item.poster_url.take());
    item.backdrop_url = non_blank(show.backdrop_url)
        .or_else(|| episode.as_ref().and_then(|e| non_blank(e.still_url.clone())))
        .or(item.backdrop_url.take());

    let air_date = episode.as_ref().and_then(|e| non_blank(e.air_date.clone()));
    if let Some(minutes) = episode.as_ref().and_then(|e| e.runtime_min) {
        item.runtime_minutes = Some(minutes);
        item.runtime_ticks = Some(minutes_to_ticks(u64::from(minutes)));
    }
    item.release_date = air_date.clone().or(item.release_date.take());

    item.extras = Some(MediaExtras::Tv(TvInfo {
        series_name,
        season_number: episode
            .as_ref()
            .and_then(|e| e.season_number)
            .or(flat.season_number),
        episode_number: episode
            .as_ref()
            .and_then(|e| e.episode_number)
            .or(flat.episode_number),
        air_date: air_date.or_else(|| flat.air_date.clone()),
        cast,
    }));
}

fn apply_music(item: &mut MediaItem, track: MusicTrackMetadata, flat: &FlatMetadata) {
    if let Some(title) = non_blank(Some(track.title)) {
        item.name = title;
    }
    item.production_year = track.year.or(item.production_year);
    if let Some(genres) = track.genres {
        item.genres = genres;
    }
    if let Some(ticks) = track.duration_s.and_then(fractional_seconds_to_ticks) {
        item.runtime_ticks = Some(ticks);
    }

    item.extras = Some(MediaExtras::Music(MusicInfo {
        artist: non_blank(track.artist).or_else(|| flat.artist.clone()),
        album: non_blank(track.album).or_else(|| flat.album.clone()),
        album_artist: flat.album_artist.clone(),
        track_number: track.track_number.or(flat.track_number),
        disc_number: track.disc_number.or(flat.disc_number),
        duration_seconds: whole_seconds(track.duration_s.or(flat.duration)),
    }));
}

fn apply_podcast(item: &mut MediaItem, episode: PodcastEpisodeMetadata, flat: &FlatMetadata) {
    let title = non_blank(Some(episode.title));
    if let Some(ref title) = title {
        item.name = title.clone();
    }
    item.overview = non_blank(episode.description).or(item.overview.take());
    item.poster_url = non_blank(episode.image_url).or(item.poster_url.take());
    if let Some(ticks) = episode.duration_s.and_then(fractional_seconds_to_ticks) {
        item.runtime_ticks = Some(ticks);
    }
    let pub_date = non_blank(episode.pub_date).or_else(|| flat.pub_date.clone());
    item.release_date = pub_date.clone().or(item.release_date.take());

    item.extras = Some(MediaExtras::Podcast(PodcastInfo {
        show_name: non_blank(episode.show_name).or_else(|| flat.show_name.clone()),
        pub_date,
        episode_title: title.or_else(|| flat.episode_title.clone()),
        duration_seconds: whole_seconds(episode.duration_s.or(flat.duration)),
    }));
}

/// Type-specific fields taken from flat metadata alone.
fn flat_extras(media_type: MediaType, flat: &FlatMetadata) -> MediaExtras {
    match media_type {
        MediaType::Movie => MediaExtras::Movie(MovieInfo {
            original_title: flat.original_title.clone(),
            tagline: flat.tagline.clone(),
            cast: cast_names(&flat.cast).unwrap_or_default(),
            director: flat.director.clone(),
            budget: None,
            revenue: None,
        }),
        MediaType::Tv => MediaExtras::Tv(TvInfo {
            series_name: flat.series_name.clone(),
            season_number: flat.season_number,
            episode_number: flat.episode_number,
            air_date: flat.air_date.clone(),
            cast: cast_names(&flat.cast).unwrap_or_default(),
        }),
        MediaType::Music => MediaExtras::Music(MusicInfo {
            artist: flat.artist.clone(),
            album: flat.album.clone(),
            album_artist: flat.album_artist.clone(),
            track_number: flat.track_number,
            disc_number: flat.disc_number,
            duration_seconds: whole_seconds(flat.duration.or(flat.duration_seconds)),
        }),
        MediaType::Podcast => MediaExtras::Podcast(PodcastInfo {
            show_name: flat.show_name.clone(),
            pub_date: flat.pub_date.clone(),
            episode_title: flat.episode_title.clone(),
            duration_seconds: whole_seconds(flat.duration.or(flat.duration_seconds)),
        }),
        MediaType::Personal => MediaExtras::Personal(PersonalInfo {
            capture_date: flat.capture_date.clone(),
            device_make: flat.device_make.clone(),
            device_model: flat.device_model.clone(),
            gps_lat: flat.gps_lat,
            gps_lon: flat.gps_lon,
            album_name: flat.album_name.clone(),
        }),
        MediaType::Video => MediaExtras::Video(VideoInfo {
            platform: flat.platform.clone(),
            channel_name: flat.channel_name.clone(),
            uploader: flat.uploader.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detail(value: serde_json::Value) -> MediaDetail {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_enriched_overrides_flat_field_by_field() {
        let item = transform_media_item(
            detail(json!({
                "media_id": "m1",
                "type": "movie",
                "title": "heat.1995",
                "metadata": {
                    "overview": "flat overview",
                    "year": 1994,
                    "genres": ["Drama"],
                    "poster_url": "/flat.jpg",
                    "director": "Someone Else"
                },
                "enriched_metadata": {
                    "movie": {
                        "title": "Heat",
                        "overview": null,
                        "year": 1995,
                        "runtime_min": 170,
                        "crew": [{ "name": "Michael Mann", "job": "Director" }],
                        "cast": ["Al Pacino", "Robert De Niro"]
                    }
                }
            })),
            MediaType::Movie,
        );

        assert_eq!(item.name, "Heat");
        assert_eq!(item.overview.as_deref(), Some("flat overview"));
        assert_eq!(item.production_year, Some(1995));
        assert_eq!(item.genres, vec!["Drama"]);
        assert_eq!(item.poster_url.as_deref(), Some("/flat.jpg"));
        assert_eq!(item.runtime_minutes, Some(170));
        assert_eq!(item.runtime_ticks, Some(minutes_to_ticks(170)));
        match item.extras {
            Some(MediaExtras::Movie(info)) => {
                assert_eq!(info.director.as_deref(), Some("Michael Mann"));
                assert_eq!(info.cast, vec!["Al Pacino", "Robert De Niro"]);
            }
            other => panic!("Expected movie extras, got {:?}", other),
        }
    }

    #[test]
    fn test_episode_takes_series_from_show() {
        let item = transform_media_item(
            detail(json!({
                "media_id": "e1",
                "type": "tv",
                "enriched_metadata": {
                    "tv_show": { "name": "Dark", "first_air_date": "2017-12-01", "genres": ["Sci-Fi"] },
                    "tv_episode": { "name": "Secrets", "season_number": 1, "episode_number": 1 }
                }
            })),
            MediaType::Tv,
        );

        assert_eq!(item.name, "Secrets");
        assert_eq!(item.production_year, Some(2017));
        match item.extras {
            Some(MediaExtras::Tv(info)) => {
                assert_eq!(info.series_name.as_deref(), Some("Dark"));
                assert_eq!(info.season_number, Some(1));
                assert_eq!(info.episode_number, Some(1));
            }
            other => panic!("Expected tv extras, got {:?}", other),
        }
    }

    #[test]
    fn test_personal_item_named_from_path() {
        let item = transform_media_item(
            detail(json!({
                "media_id": "p1",
                "type": "personal",
                "source_type": "home",
                "path": "/home/photos/Beach Day.mp4",
                "metadata": { "device_make": "Canon", "duration_seconds": 12.5 }
            })),
            MediaType::Personal,
        );

        assert_eq!(item.name, "Beach Day");
        assert_eq!(item.runtime_ticks, Some(125_000_000));
        assert_eq!(item.source_type, Some(crate::models::media::SourceType::Home));
        match item.extras {
            Some(MediaExtras::Personal(info)) => {
                assert_eq!(info.device_make.as_deref(), Some("Canon"))
            }
            other => panic!("Expected personal extras, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_uses_route_type() {
        let item = transform_media_item(
            detail(json!({ "media_id": "x", "type": "hologram", "title": "Clip" })),
            MediaType::Video,
        );
        assert_eq!(item.media_type, MediaType::Video);
        assert!(matches!(item.extras, Some(MediaExtras::Video(_))));
    }

    #[test]
    fn test_mismatched_body_is_ignored() {
        let item = transform_media_item(
            detail(json!({
                "media_id": "x",
                "type": "music",
                "title": "Song",
                "enriched_metadata": { "movie": { "title": "Not A Song" } }
            })),
            MediaType::Music,
        );
        assert_eq!(item.name, "Song");
        assert!(matches!(item.extras, Some(MediaExtras::Music(_))));
    }

    #[test]
    fn test_record_prefers_file_hash_and_builds_movie_body() {
        let record: ListRecord = serde_json::from_value(json!({
            "file_hash": "abc123",
            "id": "7",
            "title": "Alien",
            "year": 1979,
            "runtime_min": 117,
            "poster": { "file_path": "/posters/alien.jpg" }
        }))
        .unwrap();

        let item = transform_media_item(detail_from_record(record, MediaType::Movie), MediaType::Movie);
        assert_eq!(item.id, "abc123");
        assert_eq!(item.name, "Alien");
        assert_eq!(item.production_year, Some(1979));
        assert_eq!(item.runtime_minutes, Some(117));
        assert_eq!(item.poster_url.as_deref(), Some("/posters/alien.jpg"));
    }

    #[test]
    fn test_record_without_identity_gets_synthetic_id() {
        let record: ListRecord = serde_json::from_value(json!({})).unwrap();
        let a = transform_media_item(detail_from_record(record.clone(), MediaType::Podcast), MediaType::Podcast);
        let b = transform_media_item(detail_from_record(record, MediaType::Podcast), MediaType::Podcast);
        assert!(a.id.starts_with("podcast-"));
        assert_ne!(a.id, b.id);
        assert_eq!(a.name, crate::models::media::UNTITLED);
    }
}
