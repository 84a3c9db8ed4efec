//! Tweet endpoints
//!
//! - `POST /tweets` - create
//! - `DELETE /tweets/{tweetId}` - immediate delete
//! - `GET /tweets/homeTimeline/{userId}` - tweets of everyone the user follows
//! - `GET /tweets/userTimeline/{userId}` - tweets of one user

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{Tweet, TweetRepo};
use crate::discovery::FollowingsAggregator;
use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidPath};
use crate::http::server::AppState;
use crate::models::TweetContent;

/// Create tweet request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTweetRequest {
    pub user_id: i32,
    pub content: String,
}

/// Created tweet response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTweetResponse {
    pub tweet_id: i32,
    pub user_id: i32,
    pub content: String,
    pub timestamp: String,
}

impl From<Tweet> for CreatedTweetResponse {
    fn from(t: Tweet) -> Self {
        Self {
            tweet_id: t.id,
            user_id: t.user_id,
            content: t.content,
            timestamp: t.created_at.to_rfc3339(),
        }
    }
}

/// Timeline entry
#[derive(Debug, Serialize)]
pub struct TweetResponse {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Tweet> for TweetResponse {
    fn from(t: Tweet) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            content: t.content,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub tweets: Vec<TweetResponse>,
}

impl From<Vec<Tweet>> for TimelineResponse {
    fn from(tweets: Vec<Tweet>) -> Self {
        Self {
            tweets: tweets.into_iter().map(TweetResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /tweets
async fn create_tweet(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateTweetRequest>,
) -> Result<Json<CreatedTweetResponse>, ApiError> {
    let content = TweetContent::new(&req.content)?;
    let tweet = TweetRepo::new(&state.pool).create(req.user_id, &content).await?;

    tracing::debug!(tweet_id = tweet.id, user_id = tweet.user_id, "Tweet created");
    Ok(Json(CreatedTweetResponse::from(tweet)))
}

/// DELETE /tweets/{tweetId}
async fn delete_tweet(
    State(state): State<Arc<AppState>>,
    ValidPath(tweet_id): ValidPath<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    TweetRepo::new(&state.pool).delete(tweet_id).await?;

    Ok(Json(MessageResponse {
        message: format!("Tweet {} has been deleted successfully.", tweet_id),
    }))
}

/// GET /tweets/homeTimeline/{userId}
async fn home_timeline(
    State(state): State<Arc<AppState>>,
    ValidPath(user_id): ValidPath<i32>,
) -> Result<Json<TimelineResponse>, ApiError> {
    let followings = FollowingsAggregator::new(&state.discovery)
        .fetch_related_ids(user_id)
        .await?;
    let tweets = TweetRepo::new(&state.pool).list_by_owners(&followings).await?;

    Ok(Json(TimelineResponse::from(tweets)))
}

/// GET /tweets/userTimeline/{userId}
async fn user_timeline(
    State(state): State<Arc<AppState>>,
    ValidPath(user_id): ValidPath<i32>,
) -> Result<Json<TimelineResponse>, ApiError> {
    let tweets = TweetRepo::new(&state.pool).list_by_owner(user_id).await?;
    Ok(Json(TimelineResponse::from(tweets)))
}

/// Tweet routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tweets", post(create_tweet))
        .route("/tweets/{tweet_id}", delete(delete_tweet))
        .route("/tweets/homeTimeline/{user_id}", get(home_timeline))
        .route("/tweets/userTimeline/{user_id}", get(user_timeline))
}
