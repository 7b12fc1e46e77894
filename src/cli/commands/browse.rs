//! Library browsing commands.

use super::{item_line, print_items, print_json, Context};
use crate::core::facade::ALL_MEDIA_LIBRARY_ID;
use crate::models::config::BackendKind;
use crate::models::media::{MediaExtras, MediaItem, MediaType, Pagination};
use crate::services::legacy::{LibraryQuery, SortBy, SortOrder};
use anyhow::{bail, Result};
use colored::Colorize;

/// List libraries.
pub async fn libraries(ctx: &Context) -> Result<()> {
    let libraries = ctx.client.get_libraries().await;
    if ctx.json {
        return print_json(&libraries);
    }

    println!("{}", "Libraries".bold().cyan());
    if libraries.is_empty() {
        println!("  {}", "(nothing)".dimmed());
    }
    for library in &libraries {
        println!(
            "  {:<30} {:<12} {}",
            library.name.bold(),
            library.collection_type.as_deref().unwrap_or("-"),
            library.id.dimmed()
        );
    }
    Ok(())
}

/// List the items of a library, or items of one type.
#[allow(clippy::too_many_arguments)]
pub async fn items(
    ctx: &Context,
    library_id: Option<String>,
    media_type: Option<MediaType>,
    limit: usize,
    offset: usize,
    sort: Option<SortBy>,
    descending: bool,
    genres: Vec<String>,
) -> Result<()> {
    // A type filter goes straight to the typed listing, which reports
    // per-type failures.
    if library_id.is_none() {
        if let Some(media_type) = media_type {
            let page = ctx
                .client
                .get_media(Some(media_type), Pagination::new(Some(limit), offset))
                .await;
            if ctx.json {
                return print_json(&page);
            }
            println!(
                "{} ({} total)",
                media_type.label().bold().cyan(),
                page.total_count
            );
            print_items(&page.items);
            return Ok(());
        }
    }

    let library_id = match library_id {
        Some(id) => id,
        None if ctx.client.backend_kind() == BackendKind::BitHarbor => {
            ALL_MEDIA_LIBRARY_ID.to_string()
        }
        None => bail!("Pass a library id (see: harbor libraries)"),
    };
    let query = LibraryQuery {
        sort_by: sort,
        sort_order: sort.map(|_| {
            if descending {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            }
        }),
        genres,
        limit: Some(limit),
        start_index: Some(offset),
    };

    let page = ctx.client.get_library_items(&library_id, &query).await;
    if ctx.json {
        return print_json(&page);
    }

    println!(
        "{} {} ({} total)",
        "Library".bold().cyan(),
        library_id,
        page.total_count
    );
    print_items(&page.items);
    Ok(())
}

/// Show one item in detail.
pub async fn show(ctx: &Context, item_id: &str, media_type: Option<MediaType>) -> Result<()> {
    let Some(item) = ctx.client.get_item_by_id(item_id, media_type).await else {
        bail!("Item {} not found", item_id);
    };

    if ctx.json {
        return print_json(&item);
    }
    print_detail(ctx, &item);
    Ok(())
}

fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<14} {}", format!("{}:", label).dimmed(), value);
}

fn print_detail(ctx: &Context, item: &MediaItem) {
    println!("{}", item_line(item));
    println!();

    if let Some(year) = item.production_year {
        field("Year", year);
    }
    if let Some(minutes) = item.runtime_in_minutes() {
        field("Runtime", format!("{} min", minutes));
    }
    if !item.genres.is_empty() {
        field("Genres", item.genres.join(", "));
    }
    if let Some(rating) = item.community_rating {
        field("Rating", format!("{:.1}", rating));
    }
    if let Some(ref rating) = item.official_rating {
        field("Rated", rating);
    }
    if let Some(source) = item.source_type {
        field("Source", source.as_str());
    }

    match &item.extras {
        Some(MediaExtras::Movie(movie)) => {
            if let Some(ref director) = movie.director {
                field("Director", director);
            }
            if !movie.cast.is_empty() {
                field("Cast", movie.cast.join(", "));
            }
            if let Some(ref tagline) = movie.tagline {
                field("Tagline", tagline);
            }
        }
        Some(MediaExtras::Tv(tv)) => {
            if let Some(ref series) = tv.series_name {
                field("Series", series);
            }
            if let (Some(season), Some(episode)) = (tv.season_number, tv.episode_number) {
                field("Episode", format!("S{:02}E{:02}", season, episode));
            }
        }
        Some(MediaExtras::Music(music)) => {
            if let Some(ref artist) = music.artist {
                field("Artist", artist);
            }
            if let Some(ref album) = music.album {
                field("Album", album);
            }
        }
        Some(MediaExtras::Podcast(podcast)) => {
            if let Some(ref show) = podcast.show_name {
                field("Show", show);
            }
            if let Some(ref date) = podcast.pub_date {
                field("Published", date);
            }
        }
        Some(MediaExtras::Personal(personal)) => {
            if let Some(ref date) = personal.capture_date {
                field("Captured", date);
            }
            if let Some(ref album) = personal.album_name {
                field("Album", album);
            }
        }
        Some(MediaExtras::Video(video)) => {
            if let Some(ref channel) = video.channel_name {
                field("Channel", channel);
            }
        }
        None => {}
    }

    if item.user_data.playback_position_ticks > 0 {
        field(
            "Resume at",
            format!(
                "{} s",
                crate::utils::ticks::ticks_to_seconds(item.user_data.playback_position_ticks)
            ),
        );
    }
    field(
        "Stream",
        ctx.client.stream_url(&item.id, Some(item.media_type)),
    );

    if let Some(ref overview) = item.overview {
        println!();
        println!("  {}", overview);
    }
}

/// Show the home sections.
pub async fn home(ctx: &Context, limit: usize) -> Result<()> {
    let (resume, latest, favorites) = tokio::join!(
        ctx.client.get_continue_watching(limit),
        ctx.client.get_recently_added(limit),
        ctx.client.get_favorites(limit),
    );

    if ctx.json {
        return print_json(&serde_json::json!({
            "continueWatching": resume,
            "recentlyAdded": latest,
            "favorites": favorites,
        }));
    }

    println!("{}", "Continue Watching".bold().cyan());
    print_items(&resume);
    println!();
    println!("{}", "Recently Added".bold().cyan());
    print_items(&latest);
    println!();
    println!("{}", "Favorites".bold().cyan());
    print_items(&favorites);
    Ok(())
}
