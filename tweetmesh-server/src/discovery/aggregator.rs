//! Cross-service aggregation: followings from the social service
//!
//! The peer is resolved on every call. The caller turns the returned ids into
//! one local `user_id = ANY($1)` query.

use serde::Deserialize;

use super::{DiscoveryClient, DiscoveryError};

/// Service type of the social-graph peer
pub const PEER_SERVICE_TYPE: &str = "user";

#[derive(Debug, Deserialize)]
struct FollowingsResponse {
    followings: Vec<i32>,
}

/// Fetches the ids a user follows from whichever social instance the registry
/// lists first
pub struct FollowingsAggregator<'a> {
    discovery: &'a DiscoveryClient,
}

impl<'a> FollowingsAggregator<'a> {
    pub fn new(discovery: &'a DiscoveryClient) -> Self {
        Self { discovery }
    }

    /// Ids of the users `user_id` follows.
    ///
    /// Errors are not retried; a non-success peer answer is `Upstream`.
    pub async fn fetch_related_ids(&self, user_id: i32) -> Result<Vec<i32>, DiscoveryError> {
        let endpoints = self.discovery.resolve(PEER_SERVICE_TYPE).await?;
        let peer = endpoints
            .first()
            .ok_or_else(|| DiscoveryError::NoProvider {
                service_type: PEER_SERVICE_TYPE.to_owned(),
            })?;

        let url = format!("{}/users/{}/followings", peer.base_url(), user_id);
        tracing::debug!(%url, "Fetching followings from peer");

        let response = self
            .discovery
            .http()
            .get(&url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Upstream(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, %status, "Peer rejected followings request");
            return Err(DiscoveryError::Upstream(format!(
                "Error occurred while fetching followings ({})",
                status
            )));
        }

        let body: FollowingsResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Upstream(format!("unreadable followings: {}", e)))?;

        Ok(body.followings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::client::mock;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::net::SocketAddr;

    /// Registry that lists `peer` as the only user service.
    async fn registry_pointing_at(peer: SocketAddr) -> DiscoveryClient {
        let listing = json!({
            "userServices": [{"host": peer.ip().to_string(), "port": peer.port()}],
            "tweetServices": []
        });
        let registry = mock::serve(
            Router::new().route("/services", get(move || async move { Json(listing) })),
        )
        .await;
        DiscoveryClient::with_client(reqwest::Client::new(), format!("http://{}", registry))
    }

    fn peer_with(followings: Value) -> Router {
        Router::new().route(
            "/users/{id}/followings",
            get(move |Path(id): Path<i32>| async move {
                if id == 404 {
                    return Err(StatusCode::NOT_FOUND);
                }
                Ok(Json(followings))
            }),
        )
    }

    #[tokio::test]
    async fn returns_peer_followings() {
        let peer = mock::serve(peer_with(json!({"followings": [2, 3, 5]}))).await;
        let discovery = registry_pointing_at(peer).await;

        let ids = FollowingsAggregator::new(&discovery)
            .fetch_related_ids(1)
            .await
            .unwrap();
        assert_eq!(ids, vec![2, 3, 5]);
    }

    #[tokio::test]
    async fn empty_followings_is_not_an_error() {
        let peer = mock::serve(peer_with(json!({"followings": []}))).await;
        let discovery = registry_pointing_at(peer).await;

        let ids = FollowingsAggregator::new(&discovery)
            .fetch_related_ids(1)
            .await
            .unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn peer_error_status_is_upstream() {
        let peer = mock::serve(peer_with(json!({"followings": []}))).await;
        let discovery = registry_pointing_at(peer).await;

        let err = FollowingsAggregator::new(&discovery)
            .fetch_related_ids(404)
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Upstream(_)));
    }

    #[tokio::test]
    async fn dead_peer_is_upstream() {
        let peer = mock::dead_addr().await;
        let discovery = registry_pointing_at(peer).await;

        let err = FollowingsAggregator::new(&discovery)
            .fetch_related_ids(1)
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Upstream(_)));
    }

    #[tokio::test]
    async fn missing_provider_propagates() {
        let registry = mock::serve(Router::new().route(
            "/services",
            get(|| async { Json(json!({"userServices": []})) }),
        ))
        .await;
        let discovery =
            DiscoveryClient::with_client(reqwest::Client::new(), format!("http://{}", registry));

        let err = FollowingsAggregator::new(&discovery)
            .fetch_related_ids(1)
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::NoProvider { .. }));
    }
}
