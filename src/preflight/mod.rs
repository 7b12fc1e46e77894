//! Preflight checks run before commands that talk to the backend.

mod backend;
mod session;

use crate::core::facade::UnifiedClient;
use colored::Colorize;

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Passed,
    Failed { hint: String },
    /// Not run because an earlier check it depends on failed.
    Skipped,
}

/// Result of a preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    pub fn ok(name: &str, message: impl Into<String>) -> Self {
        Self::with_status(name, CheckStatus::Passed, message)
    }

    pub fn fail(name: &str, message: impl Into<String>, hint: &str) -> Self {
        Self::with_status(
            name,
            CheckStatus::Failed {
                hint: hint.to_string(),
            },
            message,
        )
    }

    pub fn skip(name: &str, message: impl Into<String>) -> Self {
        Self::with_status(name, CheckStatus::Skipped, message)
    }

    fn with_status(name: &str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, CheckStatus::Failed { .. })
    }
}

/// Run all preflight checks.
///
/// The session check only means something once the backend answers, so it
/// is skipped when the backend is unreachable.
pub async fn run_preflight_checks(client: &UnifiedClient) -> Vec<CheckResult> {
    let reachable = backend::check(client).await;
    let session = if reachable.is_failure() {
        CheckResult::skip(session::NAME, "backend unreachable")
    } else {
        session::check(client)
    };
    vec![reachable, session]
}

/// Print preflight check results.
pub fn print_results(results: &[CheckResult]) {
    for result in results {
        let tag = match result.status {
            CheckStatus::Passed => "[OK]".green(),
            CheckStatus::Failed { .. } => "[FAIL]".red(),
            CheckStatus::Skipped => "[SKIP]".dimmed(),
        };
        println!("{} {}: {}", tag, result.name.bold(), result.message);
        if let CheckStatus::Failed { hint } = &result.status {
            println!("  {} {}", "->".yellow(), hint);
        }
    }
}

/// True when no check failed. Skipped checks do not count as failures.
pub fn all_passed(results: &[CheckResult]) -> bool {
    !results.iter().any(CheckResult::is_failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::BackendKind;
    use crate::services::mock::{MockResponse, MockServer};
    use crate::services::session::{Session, SessionData};
    use crate::services::transport::Method;
    use std::sync::Arc;

    fn legacy_client(server: MockServer, session: Session) -> UnifiedClient {
        UnifiedClient::with_transport(
            BackendKind::Legacy,
            "http://jf:8096",
            Arc::new(server),
            Arc::new(session),
        )
    }

    #[tokio::test]
    async fn test_session_skipped_when_backend_unreachable() {
        let server = MockServer::new();
        server.on(
            Method::GET,
            "/System/Info/Public",
            MockResponse::network_error("connection refused"),
        );
        let results = run_preflight_checks(&legacy_client(server, Session::new())).await;

        assert!(results[0].is_failure());
        assert_eq!(results[1].status, CheckStatus::Skipped);
        assert!(!all_passed(&results));
    }

    #[tokio::test]
    async fn test_missing_session_fails() {
        let client = legacy_client(MockServer::legacy(), Session::new());
        let results = run_preflight_checks(&client).await;

        assert_eq!(results[0].status, CheckStatus::Passed);
        assert!(results[1].is_failure());
    }

    #[tokio::test]
    async fn test_all_passed_with_session() {
        let session = Session::with_data(SessionData {
            backend: BackendKind::Legacy,
            access_token: "tok".to_string(),
            user_id: "u1".to_string(),
            user_name: "Demo".to_string(),
        });
        let results = run_preflight_checks(&legacy_client(MockServer::legacy(), session)).await;

        assert!(all_passed(&results));
        assert_eq!(results[1].message, "logged in as Demo");
    }

    #[test]
    fn test_skipped_is_not_a_failure() {
        let results = vec![
            CheckResult::ok("Backend", "reachable"),
            CheckResult::skip("Session", "backend unreachable"),
        ];
        assert!(all_passed(&results));
    }
}
