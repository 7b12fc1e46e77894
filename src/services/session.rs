//! Session state shared with the adapters.
//!
//! Adapters never own the session: they receive a [`SessionProvider`] at
//! construction and read the current token on every request. Writes happen
//! only through explicit login/logout on [`Session`].

use crate::models::config::BackendKind;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Read access to the current login.
pub trait SessionProvider: Send + Sync {
    /// Bearer token of the active session.
    fn access_token(&self) -> Option<String>;

    /// Backend user id of the active session.
    fn user_id(&self) -> Option<String>;
}

/// Credentials of a logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub backend: BackendKind,
    pub access_token: String,
    pub user_id: String,
    pub user_name: String,
}

/// Outcome of a successful login against any backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub user_name: String,
    pub access_token: String,
}

impl AuthenticatedUser {
    /// Session credentials for this user on `backend`.
    pub fn into_session(self, backend: BackendKind) -> SessionData {
        SessionData {
            backend,
            access_token: self.access_token,
            user_id: self.user_id,
            user_name: self.user_name,
        }
    }
}

/// In-memory session slot.
#[derive(Debug, Default)]
pub struct Session {
    data: RwLock<Option<SessionData>>,
}

impl Session {
    /// Create an empty (logged-out) session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session that is already logged in.
    pub fn with_data(data: SessionData) -> Self {
        Self {
            data: RwLock::new(Some(data)),
        }
    }

    /// Store credentials after a login or restore.
    pub fn set(&self, data: SessionData) {
        let mut slot = self.data.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(data);
    }

    /// Forget the credentials.
    pub fn clear(&self) {
        let mut slot = self.data.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Snapshot of the current credentials.
    pub fn current(&self) -> Option<SessionData> {
        self.data
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current().is_some()
    }
}

impl SessionProvider for Session {
    fn access_token(&self) -> Option<String> {
        self.current().map(|d| d.access_token)
    }

    fn user_id(&self) -> Option<String> {
        self.current().map(|d| d.user_id)
    }
}

/// JSON file holding the persisted session between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session, if any.
    pub fn load(&self) -> Result<Option<SessionData>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let data: SessionData = serde_json::from_str(&content)?;
        Ok(Some(data))
    }

    /// Persist a session, creating parent directories as needed.
    pub fn save(&self, data: &SessionData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, content)?;
        tracing::debug!("Session saved to {:?}", self.path);
        Ok(())
    }

    /// Remove the persisted session. A missing file is not an error.
    pub fn remove(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionData {
        SessionData {
            backend: BackendKind::BitHarbor,
            access_token: "tok".to_string(),
            user_id: "admin-1".to_string(),
            user_name: "admin".to_string(),
        }
    }

    #[test]
    fn test_set_and_clear() {
        let session = Session::new();
        assert!(session.access_token().is_none());

        session.set(sample());
        assert_eq!(session.access_token().as_deref(), Some("tok"));
        assert_eq!(session.user_id().as_deref(), Some("admin-1"));

        session.clear();
        assert!(!session.is_logged_in());
    }
}
