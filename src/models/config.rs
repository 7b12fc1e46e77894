//! Configuration model.
//!
//! Loaded from `<config dir>/harbor/config.toml` when present; the
//! following environment variables override the file:
//! - `HARBOR_BACKEND`: `mock`, `legacy` or `bitharbor`
//! - `HARBOR_BITHARBOR_URL`: type-routed API base URL
//! - `HARBOR_LEGACY_URL`: ticks-based server URL
//! - `HARBOR_TIMEOUT`: request timeout in seconds

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_BITHARBOR_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_LEGACY_URL: &str = "http://localhost:8096";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Which backend the client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process mock of the ticks-based server.
    #[default]
    Mock,
    /// Jellyfin-style server.
    Legacy,
    /// Type-routed BitHarbor service.
    BitHarbor,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Mock => "mock",
            BackendKind::Legacy => "legacy",
            BackendKind::BitHarbor => "bitharbor",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(BackendKind::Mock),
            "legacy" | "jellyfin" => Ok(BackendKind::Legacy),
            "bitharbor" => Ok(BackendKind::BitHarbor),
            other => Err(Error::Config(format!("unknown backend '{}'", other))),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Active backend.
    pub backend: BackendKind,
    /// Type-routed backend configuration.
    pub bitharbor: EndpointConfig,
    /// Ticks-based backend configuration.
    pub legacy: EndpointConfig,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Where the login session is persisted.
    pub session_file: PathBuf,
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            bitharbor: EndpointConfig {
                base_url: DEFAULT_BITHARBOR_URL.to_string(),
            },
            legacy: EndpointConfig {
                base_url: DEFAULT_LEGACY_URL.to_string(),
            },
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("harbor-client/{}", env!("CARGO_PKG_VERSION")),
            session_file: config_dir().join("session.json"),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply `HARBOR_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(backend) = std::env::var("HARBOR_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Ok(url) = std::env::var("HARBOR_BITHARBOR_URL") {
            self.bitharbor.base_url = url;
        }
        if let Ok(url) = std::env::var("HARBOR_LEGACY_URL") {
            self.legacy.base_url = url;
        }
        if let Some(timeout) = std::env::var("HARBOR_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.timeout_secs = timeout;
        }
        Ok(self)
    }

    /// Base URL of the active backend.
    pub fn active_base_url(&self) -> &str {
        match self.backend {
            BackendKind::BitHarbor => self.bitharbor.base_url.trim_end_matches('/'),
            BackendKind::Legacy | BackendKind::Mock => self.legacy.base_url.trim_end_matches('/'),
        }
    }
}

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("harbor")
}

/// Load configuration from `path`, or the default location when `None`.
///
/// A missing file yields the defaults; a malformed one is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_dir().join("config.toml"));

    let config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        Config::from_toml(&content)?
    } else {
        Config::default()
    };

    config.with_env_overrides()
}
