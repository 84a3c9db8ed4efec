//! GET /metrics - Prometheus text exposition
//!
//! Always carries `http_requests_total`. The content service also reports
//! its deferred sessions: `deferred_sessions_expired_total` (counter) and
//! `deferred_sessions_pending` (gauge).

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::http::error::ApiError;
use crate::http::server::AppState;

/// GET /metrics
async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    state.metrics.observe_ledger(&state.ledger);

    let body = state.metrics.render().map_err(|e| ApiError::Internal {
        message: format!("failed to encode metrics: {}", e),
    })?;

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

/// Metrics routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/metrics", get(metrics))
}
