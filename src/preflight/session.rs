//! Login session check.

use super::CheckResult;
use crate::core::facade::UnifiedClient;

pub(super) const NAME: &str = "Session";

/// Check if a session is present for the active backend.
pub fn check(client: &UnifiedClient) -> CheckResult {
    match client.session().current() {
        Some(data) if data.backend == client.backend_kind() => {
            CheckResult::ok(NAME, format!("logged in as {}", data.user_name))
        }
        Some(data) => CheckResult::fail(
            NAME,
            format!("session belongs to the {} backend", data.backend),
            "Run: harbor login",
        ),
        None => CheckResult::fail(NAME, "not logged in", "Run: harbor login"),
    }
}
