//! Discovery registry client
//!
//! Registry wire format:
//! - `GET /services` -> `{"userServices": [{"host": "..", "port": 8000}], "tweetServices": [...]}`
//! - `POST /services` <- `{"serviceType": "user", "serviceHost": "..", "servicePort": 8000}`
//!
//! Lists are keyed `<serviceType>Services`. Ports arrive as numbers or strings
//! depending on who registered them.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::DiscoveryError;
use crate::config::RegistryConfig;

/// One live instance of a service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    pub host: String,
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: u16,
}

impl Endpoint {
    /// Base URL for requests to this instance
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Self-registration payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub service_type: String,
    pub service_host: String,
    pub service_port: u16,
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// HTTP client for the discovery registry
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    http: Client,
    registry_url: String,
}

impl DiscoveryClient {
    /// Build a client whose outbound calls give up after `timeout`.
    pub fn new(registry: &RegistryConfig, timeout: Duration) -> Result<Self, DiscoveryError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DiscoveryError::Unavailable(e.to_string()))?;

        Ok(Self::with_client(http, registry.base_url()))
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_client(http: Client, registry_url: impl Into<String>) -> Self {
        Self {
            http,
            registry_url: registry_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Shared HTTP client, reused for calls to resolved peers
    pub fn http(&self) -> &Client {
        &self.http
    }

    fn services_url(&self) -> String {
        format!("{}/services", self.registry_url)
    }

    /// Resolve `service_type` to its registered endpoints, in registry order.
    ///
    /// Always asks the registry; nothing is cached between calls.
    pub async fn resolve(&self, service_type: &str) -> Result<Vec<Endpoint>, DiscoveryError> {
        let response = self
            .http
            .get(self.services_url())
            .send()
            .await
            .map_err(|e| DiscoveryError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Unavailable(format!(
                "registry answered {}",
                status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Unavailable(format!("unreadable registry response: {}", e)))?;

        let key = format!("{}Services", service_type);
        let endpoints: Vec<Endpoint> = match body.get(&key) {
            Some(list) => serde_json::from_value(list.clone()).map_err(|e| {
                DiscoveryError::Unavailable(format!("malformed '{}' list: {}", key, e))
            })?,
            None => Vec::new(),
        };

        if endpoints.is_empty() {
            return Err(DiscoveryError::NoProvider {
                service_type: service_type.to_owned(),
            });
        }

        tracing::debug!(service_type, count = endpoints.len(), "Resolved endpoints");
        Ok(endpoints)
    }

    /// Announce this instance to the registry.
    pub async fn register(&self, registration: &Registration) -> Result<(), DiscoveryError> {
        let response = self
            .http
            .post(self.services_url())
            .json(registration)
            .send()
            .await
            .map_err(|e| DiscoveryError::Registration(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Registration(format!(
                "registry answered {}: {}",
                status, body
            )));
        }

        tracing::info!(
            service_type = %registration.service_type,
            host = %registration.service_host,
            port = registration.service_port,
            "Registered with discovery registry"
        );
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn client_for(addr: std::net::SocketAddr) -> DiscoveryClient {
        DiscoveryClient::with_client(Client::new(), format!("http://{}", addr))
    }

    fn registry(body: Value) -> Router {
        Router::new().route("/services", get(move || async move { Json(body) }))
    }

    #[tokio::test]
    async fn resolves_in_registry_order() {
        let addr = mock::serve(registry(json!({
            "userServices": [
                {"host": "user-a", "port": 8000},
                {"host": "user-b", "port": "8010"}
            ],
            "tweetServices": []
        })))
        .await;

        let endpoints = client_for(addr).resolve("user").await.unwrap();
        assert_eq!(
            endpoints,
            vec![
                Endpoint { host: "user-a".into(), port: 8000 },
                Endpoint { host: "user-b".into(), port: 8010 },
            ]
        );
        assert_eq!(endpoints[0].base_url(), "http://user-a:8000");
    }

    #[tokio::test]
    async fn empty_list_is_no_provider() {
        let addr = mock::serve(registry(json!({"userServices": [], "tweetServices": []}))).await;

        let err = client_for(addr).resolve("user").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::NoProvider { ref service_type } if service_type == "user"));
    }

    #[tokio::test]
    async fn unknown_type_is_no_provider() {
        let addr = mock::serve(registry(json!({"userServices": []}))).await;

        let err = client_for(addr).resolve("search").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::NoProvider { .. }));
    }

    #[tokio::test]
    async fn registry_error_status_is_unavailable() {
        let router = Router::new().route(
            "/services",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let addr = mock::serve(router).await;

        let err = client_for(addr).resolve("user").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Unavailable(_)));
    }

    #[tokio::test]
    async fn unreachable_registry_is_unavailable() {
        let addr = mock::dead_addr().await;

        let err = client_for(addr).resolve("user").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Unavailable(_)));
    }

    #[tokio::test]
    async fn register_posts_camel_case_payload() {
        let received: Arc<Mutex<Option<Value>>> = Arc::default();
        let sink = Arc::clone(&received);
        let router = Router::new().route(
            "/services",
            axum::routing::post(move |Json(body): Json<Value>| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock().unwrap() = Some(body);
                    Json(json!({"message": "Service added successfully"}))
                }
            }),
        );
        let addr = mock::serve(router).await;

        client_for(addr)
            .register(&Registration {
                service_type: "tweet".into(),
                service_host: "tweet-1".into(),
                service_port: 8001,
            })
            .await
            .unwrap();

        assert_eq!(
            received.lock().unwrap().clone(),
            Some(json!({"serviceType": "tweet", "serviceHost": "tweet-1", "servicePort": 8001}))
        );
    }

    #[tokio::test]
    async fn rejected_registration_is_an_error() {
        let router = Router::new().route(
            "/services",
            axum::routing::post(|| async { (StatusCode::BAD_REQUEST, "Invalid serviceType") }),
        );
        let addr = mock::serve(router).await;

        let err = client_for(addr)
            .register(&Registration {
                service_type: "gateway".into(),
                service_host: "localhost".into(),
                service_port: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Registration(ref msg) if msg.contains("400")));
    }
}
