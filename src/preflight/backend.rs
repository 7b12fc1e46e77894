//! Backend reachability check.

use super::CheckResult;
use crate::core::facade::UnifiedClient;
use crate::models::config::BackendKind;

/// Check if the configured backend answers its health endpoint.
pub async fn check(client: &UnifiedClient) -> CheckResult {
    let name = format!("{} backend", client.backend_kind());
    if client.health_check().await {
        return CheckResult::ok(&name, "reachable");
    }

    let hint = match client.backend_kind() {
        BackendKind::BitHarbor => "Check bitharbor.base_url or set HARBOR_BITHARBOR_URL",
        BackendKind::Legacy => "Check legacy.base_url or set HARBOR_LEGACY_URL",
        BackendKind::Mock => "The mock backend should always answer; rerun with --verbose",
    };
    CheckResult::fail(&name, "not reachable", hint)
}
