//! `GET /health` body.

use serde::Serialize;

/// Liveness of the tracker. `status` is `"healthy"` only when the click
/// store answers; redirects cannot record clicks otherwise.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Click store reachability (Postgres pool or in-memory store).
    pub store: CheckStatus,
}

#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub status: String,

    /// Connection detail, or the failure reason when the check did not pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
