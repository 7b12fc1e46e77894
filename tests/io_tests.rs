//! Integration tests for file I/O operations.
//!
//! Tests cover:
//! - Session save/load/remove
//! - Config file loading

use harbor_client::models::config::{load_config, BackendKind};
use harbor_client::services::session::{SessionData, SessionStore};
use std::fs;
use tempfile::TempDir;

fn sample_session() -> SessionData {
    SessionData {
        backend: BackendKind::BitHarbor,
        access_token: "jwt-abc".to_string(),
        user_id: "admin-1".to_string(),
        user_name: "ops".to_string(),
    }
}

// ========== SESSION I/O TESTS ==========

#[test]
fn test_save_and_load_session() {
    let temp_dir = TempDir::new().unwrap();
    let store = SessionStore::new(temp_dir.path().join("nested").join("session.json"));

    // Save
    store.save(&sample_session()).unwrap();
    assert!(store.path().exists());

    // Load
    let loaded = store.load().unwrap();
    assert_eq!(loaded, Some(sample_session()));
}

#[test]
fn test_missing_session_is_none() {
    let temp_dir = TempDir::new().unwrap();
    let store = SessionStore::new(temp_dir.path().join("session.json"));
    assert_eq!(store.load().unwrap(), None);
}

#[test]
fn test_remove_session() {
    let temp_dir = TempDir::new().unwrap();
    let store = SessionStore::new(temp_dir.path().join("session.json"));

    store.save(&sample_session()).unwrap();
    store.remove().unwrap();
    assert!(!store.path().exists());

    // Removing twice is fine
    store.remove().unwrap();
}

#[test]
fn test_corrupt_session_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("session.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(SessionStore::new(path).load().is_err());
}

// ========== CONFIG I/O TESTS ==========

#[test]
fn test_load_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
timeout_secs = 5

[legacy]
base_url = "http://media-box:8096/"
"#,
    )
    .unwrap();

    let config = load_config(Some(path.as_path())).unwrap();
    assert_eq!(config.timeout_secs, 5);
    assert_eq!(config.legacy.base_url, "http://media-box:8096/");
}

#[test]
fn test_malformed_config_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "backend = [").unwrap();

    assert!(load_config(Some(path.as_path())).is_err());
}

#[test]
fn test_missing_config_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_config(Some(temp_dir.path().join("absent.toml").as_path())).unwrap();
    assert_eq!(config.bitharbor.base_url, "http://localhost:8080/api/v1");
}
