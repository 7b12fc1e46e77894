//! Integration tests for the catalog ingest workflow.
//!
//! Tests cover:
//! - Input validation before any request
//! - Search outcomes (matches, none, failure)
//! - Concurrent downloads and in-flight rejection
//! - Retry after a failed download
//! - Planned downloads and expired matches

use harbor_client::core::ingest::{CatalogIngest, CatalogService, DownloadState, NoticeKind, SearchState};
use harbor_client::core::facade::UnifiedClient;
use harbor_client::models::config::BackendKind;
use harbor_client::models::media::MediaType;
use harbor_client::services::bitharbor::BitHarborAdapter;
use harbor_client::services::mock::{MockResponse, MockServer};
use harbor_client::services::session::Session;
use harbor_client::services::transport::{ApiClient, Method};
use harbor_client::Error;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const SEARCH: &str = "/movies/catalog/search";
const DOWNLOAD: &str = "/movies/catalog/download";

fn matches() -> serde_json::Value {
    json!({
        "matches": [
            {
                "match_key": "k1",
                "tmdb_movie": { "title": "Nosferatu", "year": 1922 },
                "best_candidate": { "identifier": "nosferatu-1922", "score": 0.97 }
            },
            {
                "match_key": "k2",
                "tmdb_movie": { "title": "Metropolis", "year": 1927 },
                "best_candidate": { "identifier": "metropolis-1927", "score": 0.91 }
            }
        ],
        "total": 2
    })
}

fn downloaded(key: &str, title: &str) -> serde_json::Value {
    json!({
        "match_key": key,
        "title": title,
        "downloaded": true,
        "destination": format!("/media/movies/{}", title)
    })
}

fn workflow(server: &Arc<MockServer>) -> CatalogIngest {
    let adapter = BitHarborAdapter::new(ApiClient::new(
        "http://nas:8080/api/v1",
        server.clone(),
        Arc::new(Session::new()),
    ));
    let service: Arc<dyn CatalogService> = Arc::new(adapter);
    CatalogIngest::new(service, MediaType::Movie)
}

fn server_with_matches() -> Arc<MockServer> {
    let server = Arc::new(MockServer::new());
    server.on(Method::GET, SEARCH, MockResponse::json(matches()));
    server
}

// ========== SEARCH ==========

#[tokio::test]
async fn test_invalid_input_sends_nothing() {
    let server = server_with_matches();
    let workflow = workflow(&server);

    assert!(matches!(
        workflow.search("   ", None).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        workflow.search("Nosferatu", Some("1922a")).await,
        Err(Error::Validation(_))
    ));

    assert!(server.requests().is_empty());
    assert_eq!(workflow.snapshot().await.search, SearchState::Idle);
}

#[tokio::test]
async fn test_search_sends_trimmed_query_and_year() {
    let server = server_with_matches();
    let workflow = workflow(&server).with_limit(3);

    let found = workflow.search("  Nosferatu ", Some(" 1922 ")).await.unwrap();
    assert_eq!(found.len(), 2);

    let sent = server.requests_to(Method::GET, SEARCH);
    assert_eq!(sent[0].query_param("query"), Some("Nosferatu"));
    assert_eq!(sent[0].query_param("year"), Some("1922"));
    assert_eq!(sent[0].query_param("limit"), Some("3"));

    let snapshot = workflow.snapshot().await;
    assert_eq!(snapshot.search, SearchState::MatchesFound);
    assert_eq!(snapshot.query.as_deref(), Some("Nosferatu"));
    assert!(snapshot.notice.is_none());
}

#[tokio::test]
async fn test_no_matches() {
    let server = Arc::new(MockServer::new());
    server.on(
        Method::GET,
        SEARCH,
        MockResponse::json(json!({ "matches": [], "total": 0 })),
    );
    let workflow = workflow(&server);

    assert!(workflow.search("Zzyzx", None).await.unwrap().is_empty());

    let snapshot = workflow.snapshot().await;
    assert_eq!(snapshot.search, SearchState::NoMatches);
    let notice = snapshot.notice.unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.message, "No catalog matches found.");
}

#[tokio::test]
async fn test_failed_search_keeps_previous_matches() {
    let server = Arc::new(MockServer::new());
    server.on_sequence(
        Method::GET,
        SEARCH,
        vec![MockResponse::json(matches()), MockResponse::status(502)],
    );
    let workflow = workflow(&server);

    workflow.search("Nosferatu", None).await.unwrap();
    assert!(workflow.search("Metropolis", None).await.is_err());

    let snapshot = workflow.snapshot().await;
    assert_eq!(snapshot.matches.len(), 2);
    match snapshot.search {
        SearchState::SearchFailed(message) => {
            assert!(message.starts_with("Catalog search failed"))
        }
        other => panic!("Expected SearchFailed, got {:?}", other),
    }

    // Previous matches stay downloadable.
    server.on(Method::POST, DOWNLOAD, MockResponse::json(downloaded("k1", "Nosferatu")));
    assert!(workflow.download("k1", true).await.is_ok());
}

#[tokio::test]
async fn test_unsupported_backend_fails_search() {
    let client = UnifiedClient::with_transport(
        BackendKind::Legacy,
        "http://jf:8096",
        Arc::new(MockServer::legacy()),
        Arc::new(Session::new()),
    );
    let workflow = CatalogIngest::new(Arc::new(client), MediaType::Movie);

    assert!(workflow.search("Nosferatu", None).await.is_err());
    assert!(matches!(
        workflow.snapshot().await.search,
        SearchState::SearchFailed(_)
    ));
}

// ========== DOWNLOAD ==========

#[tokio::test]
async fn test_unknown_match_is_rejected() {
    let server = server_with_matches();
    let workflow = workflow(&server);
    workflow.search("Nosferatu", None).await.unwrap();

    assert!(matches!(
        workflow.download("k9", true).await,
        Err(Error::Validation(_))
    ));
    assert!(server.requests_to(Method::POST, DOWNLOAD).is_empty());
}

#[tokio::test]
async fn test_different_matches_download_concurrently() {
    let server = server_with_matches();
    server.on(
        Method::POST,
        DOWNLOAD,
        MockResponse::json(downloaded("k", "Film")).after(Duration::from_millis(200)),
    );
    let workflow = workflow(&server);
    workflow.search("silent", None).await.unwrap();

    let (a, b, during) = tokio::join!(
        workflow.download("k1", true),
        workflow.download("k2", true),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            workflow.snapshot().await
        }
    );

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(during.download_state("k1"), Some(&DownloadState::Downloading));
    assert_eq!(during.download_state("k2"), Some(&DownloadState::Downloading));

    let after = workflow.snapshot().await;
    assert!(matches!(after.download_state("k1"), Some(DownloadState::Succeeded(_))));
    assert!(matches!(after.download_state("k2"), Some(DownloadState::Succeeded(_))));
    // The match list survives downloads.
    assert_eq!(after.matches.len(), 2);
}

#[tokio::test]
async fn test_same_match_rejected_while_in_flight() {
    let server = server_with_matches();
    server.on(
        Method::POST,
        DOWNLOAD,
        MockResponse::json(downloaded("k1", "Nosferatu")).after(Duration::from_millis(200)),
    );
    let workflow = workflow(&server);
    workflow.search("Nosferatu", None).await.unwrap();

    let (first, second) = tokio::join!(workflow.download("k1", true), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        workflow.download("k1", true).await
    });

    assert!(first.is_ok());
    match second {
        Err(Error::DownloadInFlight(key)) => assert_eq!(key, "k1"),
        other => panic!("Expected DownloadInFlight, got {:?}", other),
    }
    assert_eq!(server.requests_to(Method::POST, DOWNLOAD).len(), 1);
}

#[tokio::test]
async fn test_retry_after_failure() {
    let server = server_with_matches();
    server.on_sequence(
        Method::POST,
        DOWNLOAD,
        vec![
            MockResponse::status(500),
            MockResponse::json(downloaded("k1", "Nosferatu")),
        ],
    );
    let workflow = workflow(&server);
    workflow.search("Nosferatu", None).await.unwrap();

    assert!(workflow.download("k1", true).await.is_err());
    let failed = workflow.snapshot().await;
    match failed.download_state("k1") {
        Some(DownloadState::Failed(message)) => assert!(message.starts_with("Download failed")),
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert_eq!(failed.notice.unwrap().kind, NoticeKind::Error);

    let result = workflow.download("k1", true).await.unwrap();
    assert!(result.downloaded);
    let notice = workflow.snapshot().await.notice.unwrap();
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.message, "Download completed for Nosferatu");
}

#[tokio::test]
async fn test_expired_match_asks_for_new_search() {
    let server = server_with_matches();
    server.on(Method::POST, DOWNLOAD, MockResponse::status(410));
    let workflow = workflow(&server);
    workflow.search("Nosferatu", None).await.unwrap();

    assert!(workflow.download("k2", true).await.is_err());
    assert_eq!(
        workflow.snapshot().await.download_state("k2"),
        Some(&DownloadState::Failed(
            "This catalog match is no longer available. Search again.".to_string()
        ))
    );
}

#[tokio::test]
async fn test_planned_download() {
    let server = server_with_matches();
    server.on(
        Method::POST,
        DOWNLOAD,
        MockResponse::json(json!({ "match_key": "k2", "title": "", "downloaded": false })),
    );
    let workflow = workflow(&server);
    workflow.search("Metropolis", None).await.unwrap();

    let result = workflow.download("k2", false).await.unwrap();
    assert!(!result.downloaded);

    let sent = server.requests_to(Method::POST, DOWNLOAD);
    assert_eq!(sent[0].body.clone().unwrap()["execute"], false);
    assert_eq!(
        workflow.snapshot().await.notice.unwrap().message,
        "Download planned for Metropolis"
    );
}

#[tokio::test]
async fn test_clear_notice() {
    let server = Arc::new(MockServer::new());
    server.on(Method::GET, SEARCH, MockResponse::status(500));
    let workflow = workflow(&server);

    let _ = workflow.search("Nosferatu", None).await;
    assert!(workflow.snapshot().await.notice.is_some());
    workflow.clear_notice().await;
    assert!(workflow.snapshot().await.notice.is_none());
}
