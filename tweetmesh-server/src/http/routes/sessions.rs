//! Deferred deletion endpoints
//!
//! - `DELETE /users/{userId}/tweets/first-phase` - delete the user's tweets in
//!   a transaction that stays open; returns the session token
//! - `GET /sessions/{token}/commit` - make the deletion durable
//! - `GET /sessions/{token}/rollback` - undo it
//! - `GET /sessions` - pending sessions with their age
//!
//! Each token resolves exactly once; any later use is 404.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::{ValidPath, ValidSessionToken};
use crate::http::server::AppState;
use crate::txn::{begin_owner_deletion, protocol, DeferredDeletion, PendingInfo, SessionToken};

#[derive(Debug, Serialize)]
pub struct ResolvedResponse {
    pub session: SessionToken,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<PendingInfo>,
}

/// DELETE /users/{userId}/tweets/first-phase
async fn begin_deletion(
    State(state): State<Arc<AppState>>,
    ValidPath(user_id): ValidPath<i32>,
) -> Result<Json<DeferredDeletion>, ApiError> {
    let deletion = begin_owner_deletion(&state.pool, &state.ledger, user_id).await?;
    Ok(Json(deletion))
}

/// GET /sessions/{token}/commit
async fn commit(
    State(state): State<Arc<AppState>>,
    ValidSessionToken(token): ValidSessionToken,
) -> Result<Json<ResolvedResponse>, ApiError> {
    protocol::commit(&*state.ledger, &token).await?;

    Ok(Json(ResolvedResponse {
        session: token,
        message: format!("Transaction {} committed", token),
    }))
}

/// GET /sessions/{token}/rollback
async fn rollback(
    State(state): State<Arc<AppState>>,
    ValidSessionToken(token): ValidSessionToken,
) -> Result<Json<ResolvedResponse>, ApiError> {
    protocol::rollback(&*state.ledger, &token).await?;

    Ok(Json(ResolvedResponse {
        session: token,
        message: format!("Transaction {} rolled back", token),
    }))
}

/// GET /sessions
async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.ledger.pending(),
    })
}

/// Session routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/{user_id}/tweets/first-phase", delete(begin_deletion))
        .route("/sessions", get(list_sessions))
        .route("/sessions/{token}/commit", get(commit))
        .route("/sessions/{token}/rollback", get(rollback))
}
