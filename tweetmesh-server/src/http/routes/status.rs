//! Liveness endpoint
//!
//! GET /status - `{"status": "OK"}` while the process is serving

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// GET /status
async fn status() -> Json<StatusResponse> {
    Json(StatusResponse { status: "OK" })
}

/// Status routes
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/status", get(status))
}
