//! Error types for the harbor client.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harbor client.
#[derive(Error, Debug)]
pub enum Error {
    // Session errors
    #[error("Not logged in. Run: harbor login")]
    NotAuthenticated,

    #[error("Unauthorized request to {endpoint}")]
    Unauthorized { endpoint: String },

    // Transport errors
    #[error("Request to {endpoint} failed with status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Not found: {0}")]
    NotFound(String),

    // Local validation errors
    #[error("{0}")]
    Validation(String),

    // Catalog errors
    #[error("Download already in progress for match {0}")]
    DownloadInFlight(String),

    // Backend capability errors
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // TOML errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a validation error from a string.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    /// Map a non-success HTTP status to the matching error.
    pub fn from_status(endpoint: &str, status: u16) -> Self {
        match status {
            401 => Error::Unauthorized {
                endpoint: endpoint.to_string(),
            },
            404 => Error::NotFound(endpoint.to_string()),
            _ => Error::Status {
                endpoint: endpoint.to_string(),
                status,
            },
        }
    }

    /// Whether the backend reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Whether the backend rejected the session token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized { .. } => Some(401),
            Error::NotFound(_) => Some(404),
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
