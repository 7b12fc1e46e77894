//! Search hit normalization and cross-type merging.

use crate::models::media::{resolve_name, MediaItem, MediaType, ScoredItem};
use serde::Deserialize;

/// Default number of vector-search results.
pub const DEFAULT_K: usize = 20;

/// Largest `k` the backend accepts.
pub const MAX_K: usize = 100;

/// One hit as returned by the search endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchHit {
    pub media_id: Option<String>,
    pub id: Option<String>,
    pub file_hash: Option<String>,
    pub score: Option<f32>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub preview_url: Option<String>,
    pub poster_url: Option<String>,
    pub path: Option<String>,
    pub year: Option<i32>,
}

/// Search response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

/// Clamp a requested `k` into `1..=MAX_K`, defaulting to [`DEFAULT_K`].
pub fn clamp_k(k: Option<usize>) -> usize {
    k.unwrap_or(DEFAULT_K).clamp(1, MAX_K)
}

/// Turn search hits into scored items.
///
/// Hits without `media_id`, `id` or `file_hash` get a synthesized id, so an
/// item's id is never empty and unidentified hits never share one. Hits with
/// a missing or unknown type take `route_type`.
pub fn normalize_hits(hits: Vec<SearchHit>, route_type: MediaType) -> Vec<ScoredItem> {
    hits.into_iter()
        .map(|hit| normalize_hit(hit, route_type))
        .collect()
}

fn normalize_hit(hit: SearchHit, route_type: MediaType) -> ScoredItem {
    let media_type = MediaType::from_backend(hit.media_type.as_deref(), route_type);
    let id = [&hit.media_id, &hit.id, &hit.file_hash]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string();
    let name = resolve_name(
        [hit.title.as_deref(), hit.name.as_deref()],
        hit.path.as_deref(),
    );

    let mut item = MediaItem::new(id, name, media_type);
    item.overview = hit.overview.filter(|s| !s.trim().is_empty());
    item.poster_url = hit
        .preview_url
        .or(hit.poster_url)
        .filter(|s| !s.trim().is_empty());
    item.production_year = hit.year;

    let score = hit.score.filter(|s| s.is_finite()).unwrap_or(0.0);
    ScoredItem { item, score }
}

/// Merge per-type result lists into one list of at most `k` items.
///
/// Lists are concatenated in the order given, then stably sorted by score,
/// highest first. Ties keep their concatenation order.
pub fn merge_top_k(per_type: Vec<Vec<ScoredItem>>, k: usize) -> Vec<ScoredItem> {
    let mut merged: Vec<ScoredItem> = per_type.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged.truncate(k);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hits(value: serde_json::Value) -> Vec<SearchHit> {
        serde_json::from_value::<SearchResponse>(value).unwrap().results
    }

    fn scored(id: &str, score: f32) -> ScoredItem {
        ScoredItem {
            item: MediaItem::new(id, id, MediaType::Movie),
            score,
        }
    }

    #[test]
    fn test_unidentified_hits_get_distinct_ids() {
        let results = normalize_hits(
            hits(json!({ "results": [
                { "title": "A", "score": 0.9 },
                { "title": "B", "score": 0.8 }
            ]})),
            MediaType::Video,
        );
        assert_eq!(results.len(), 2);
        assert!(!results[0].item.id.is_empty());
        assert!(!results[1].item.id.is_empty());
        assert_ne!(results[0].item.id, results[1].item.id);
        assert_eq!(results[0].item.media_type, MediaType::Video);
    }

    #[test]
    fn test_id_precedence() {
        let results = normalize_hits(
            hits(json!({ "results": [
                { "id": "2", "file_hash": "h", "media_id": "1" },
                { "id": "", "file_hash": "h2" }
            ]})),
            MediaType::Movie,
        );
        assert_eq!(results[0].item.id, "1");
        assert_eq!(results[1].item.id, "h2");
    }

    #[test]
    fn test_missing_score_is_zero() {
        let results = normalize_hits(hits(json!({ "results": [{ "id": "x" }] })), MediaType::Tv);
        assert_eq!(results[0].score, 0.0);
        assert_eq!(results[0].item.name, crate::models::media::UNTITLED);
    }

    #[test]
    fn test_merge_top_k_orders_and_truncates() {
        let merged = merge_top_k(
            vec![
                vec![scored("m1", 0.5), scored("m2", 0.9)],
                vec![scored("t1", 0.7)],
                vec![scored("p1", 0.9)],
            ],
            3,
        );
        let ids: Vec<&str> = merged.iter().map(|s| s.item.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "p1", "t1"]);

        for pair in merged.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_clamp_k() {
        assert_eq!(clamp_k(None), DEFAULT_K);
        assert_eq!(clamp_k(Some(0)), 1);
        assert_eq!(clamp_k(Some(500)), MAX_K);
    }
}
