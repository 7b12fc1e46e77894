//! Integration tests for the backend-agnostic client.
//!
//! Tests cover:
//! - Backend selection from configuration
//! - Login storing the session
//! - Virtual library routing on the type-routed backend
//! - Degraded answers for unsupported features

use harbor_client::core::facade::{UnifiedClient, ALL_MEDIA_LIBRARY_ID};
use harbor_client::models::config::{BackendKind, Config};
use harbor_client::models::media::{MediaType, Pagination};
use harbor_client::services::legacy::LibraryQuery;
use harbor_client::services::mock::{MockResponse, MockServer};
use harbor_client::services::session::Session;
use harbor_client::services::transport::Method;
use serde_json::json;
use std::sync::Arc;

fn bitharbor(server: &Arc<MockServer>) -> UnifiedClient {
    UnifiedClient::with_transport(
        BackendKind::BitHarbor,
        "http://nas:8080/api/v1",
        server.clone(),
        Arc::new(Session::new()),
    )
}

fn all_routes(server: &MockServer, records: usize) {
    for t in MediaType::ALL {
        let items: Vec<serde_json::Value> = (0..records)
            .map(|i| json!({ "file_hash": format!("{}-{}", t.route(), i), "title": format!("{} {}", t, i) }))
            .collect();
        server.on(
            Method::GET,
            &format!("/{}/all", t.route()),
            MockResponse::json(json!(items)),
        );
    }
}

// ========== MOCK BACKEND ==========

#[tokio::test]
async fn test_mock_backend_from_default_config() {
    let client = UnifiedClient::from_config(&Config::default(), Arc::new(Session::new())).unwrap();
    assert_eq!(client.backend_kind(), BackendKind::Mock);
    assert!(client.health_check().await);

    let session = client.login("demo", "demo").await.unwrap();
    assert_eq!(session.backend, BackendKind::Mock);
    assert_eq!(session.user_id, "mock-user");
    assert!(client.session().is_logged_in());

    assert!(client.get_libraries().await.is_empty());
    assert!(client.get_continue_watching(5).await.is_empty());
    assert!(client.toggle_favorite("m1", false).await);

    client.logout();
    assert!(!client.session().is_logged_in());
}

// ========== TYPE-ROUTED BACKEND ==========

#[tokio::test]
async fn test_all_media_library_lists_every_type() {
    let server = Arc::new(MockServer::new());
    all_routes(&server, 2);
    let client = bitharbor(&server);

    let query = LibraryQuery {
        limit: Some(5),
        ..Default::default()
    };
    let page = client.get_library_items(ALL_MEDIA_LIBRARY_ID, &query).await;

    assert_eq!(page.total_count, 12);
    assert_eq!(page.items.len(), 5);
    assert_eq!(server.requests().len(), 6);
}

#[tokio::test]
async fn test_library_id_can_name_a_type() {
    let server = Arc::new(MockServer::new());
    all_routes(&server, 3);
    let client = bitharbor(&server);

    let page = client
        .get_library_items("podcasts", &LibraryQuery::default())
        .await;

    assert_eq!(page.total_count, 3);
    assert!(page.items.iter().all(|i| i.media_type == MediaType::Podcast));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_login_stores_session_and_sends_token() {
    let server = Arc::new(MockServer::new());
    server.on(
        Method::POST,
        "/auth/login",
        MockResponse::json(json!({
            "access_token": "jwt-1",
            "admin": { "admin_id": "a1", "email": "ops@example.com", "display_name": "Ops" }
        })),
    );
    all_routes(&server, 0);
    let client = bitharbor(&server);

    let session = client.login("ops@example.com", "pw").await.unwrap();
    assert_eq!(session.backend, BackendKind::BitHarbor);
    assert_eq!(session.user_name, "Ops");

    client
        .get_media(Some(MediaType::Movie), Pagination::default())
        .await;
    let sent = server.requests_to(Method::GET, "/movies/all");
    assert_eq!(sent[0].header("Authorization"), Some("Bearer jwt-1"));
}

#[tokio::test]
async fn test_vector_search_failure_degrades_to_empty() {
    let server = Arc::new(MockServer::new());
    let client = bitharbor(&server);

    let results = client.vector_search("anything", None, None).await;
    assert!(results.results.is_empty());
    assert!(client.search("anything", 10).await.is_empty());
}

#[tokio::test]
async fn test_unknown_item_is_none() {
    let server = Arc::new(MockServer::new());
    let client = bitharbor(&server);
    assert!(client.get_item_by_id("missing", Some(MediaType::Tv)).await.is_none());
}

#[tokio::test]
async fn test_playback_is_unsupported_on_type_routed() {
    let server = Arc::new(MockServer::new());
    let client = bitharbor(&server);

    assert!(!client.report_playback_progress("m1", 10, false).await);
    assert!(!client.report_playback_stopped("m1", 10).await);
    assert!(server.requests().is_empty());
    assert_eq!(
        client.stream_url("m1", Some(MediaType::Music)),
        "http://nas:8080/api/v1/music/media/m1/stream"
    );
}

#[tokio::test]
async fn test_type_routed_only_operations() {
    let legacy = UnifiedClient::with_transport(
        BackendKind::Legacy,
        "http://jf:8096",
        Arc::new(MockServer::legacy()),
        Arc::new(Session::new()),
    );
    assert!(legacy.type_routed().is_err());
    assert!(legacy
        .get_media(None, Pagination::default())
        .await
        .items
        .is_empty());
    assert_eq!(
        legacy.image_url("m1", "Primary", None).as_deref(),
        Some("http://jf:8096/Items/m1/Images/Primary")
    );
}
