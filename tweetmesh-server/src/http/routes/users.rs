//! User and follow endpoints (social service)

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{User, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidPath};
use crate::http::server::AppState;
use crate::models::{Password, Username};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub follow_user_id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfollowRequest {
    pub unfollow_user_id: i32,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FollowingsResponse {
    pub followings: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct FollowersResponse {
    pub followers: Vec<i32>,
}

/// POST /users/register
async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<Json<User>, ApiError> {
    let username = Username::new(&req.username)?;
    let password = Password::new(&req.password)?;
    let user = UserRepo::new(&state.pool).register(&username, &password).await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok(Json(user))
}

/// POST /users/{userId}/follow
async fn follow(
    State(state): State<Arc<AppState>>,
    ValidPath(user_id): ValidPath<i32>,
    ValidJson(req): ValidJson<FollowRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = UserRepo::new(&state.pool);
    let user = repo.get(user_id).await?;
    let target = repo.get(req.follow_user_id).await?;
    repo.follow(user.id, target.id).await?;

    Ok(Json(MessageResponse {
        message: format!("User {} is now following {}", user.username, target.username),
    }))
}

/// DELETE /users/{userId}/unfollow
async fn unfollow(
    State(state): State<Arc<AppState>>,
    ValidPath(user_id): ValidPath<i32>,
    ValidJson(req): ValidJson<UnfollowRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = UserRepo::new(&state.pool);
    let user = repo.get(user_id).await?;
    let target = repo.get(req.unfollow_user_id).await?;
    repo.unfollow(user.id, target.id).await?;

    Ok(Json(MessageResponse {
        message: format!(
            "User {} is no longer following {}",
            user.username, target.username
        ),
    }))
}

/// GET /users/{userId}/followings
async fn followings(
    State(state): State<Arc<AppState>>,
    ValidPath(user_id): ValidPath<i32>,
) -> Result<Json<FollowingsResponse>, ApiError> {
    let repo = UserRepo::new(&state.pool);
    repo.get(user_id).await?;

    Ok(Json(FollowingsResponse {
        followings: repo.followings(user_id).await?,
    }))
}

/// GET /users/{userId}/followers
async fn followers(
    State(state): State<Arc<AppState>>,
    ValidPath(user_id): ValidPath<i32>,
) -> Result<Json<FollowersResponse>, ApiError> {
    let repo = UserRepo::new(&state.pool);
    repo.get(user_id).await?;

    Ok(Json(FollowersResponse {
        followers: repo.followers(user_id).await?,
    }))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/{user_id}/follow", post(follow))
        .route("/users/{user_id}/unfollow", delete(unfollow))
        .route("/users/{user_id}/followings", get(followings))
        .route("/users/{user_id}/followers", get(followers))
}
