//! Request governor - per-request deadline plus outcome counting
//!
//! Wraps every route of a service. A handler still running when the deadline
//! elapses is dropped; the client gets a 408 instead. Every final status,
//! 408 included, is counted.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use super::metrics::ServiceMetrics;

/// Middleware state
#[derive(Debug, Clone)]
pub struct RequestGovernor {
    pub deadline: Duration,
    pub metrics: Arc<ServiceMetrics>,
}

impl RequestGovernor {
    pub fn new(deadline: Duration, metrics: Arc<ServiceMetrics>) -> Self {
        Self { deadline, metrics }
    }
}

/// Run the rest of the stack under the deadline and count the result.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn govern(State(governor): State<RequestGovernor>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = match tokio::time::timeout(governor.deadline, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                %method,
                %path,
                deadline_secs = governor.deadline.as_secs(),
                "Request exceeded deadline, handler dropped"
            );
            ApiError::DeadlineExceeded {
                seconds: governor.deadline.as_secs(),
            }
            .into_response()
        }
    };

    governor.metrics.record(response.status().as_u16());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceKind;
    use crate::txn::protocol::fake::{FakeTx, Journal};
    use crate::txn::protocol::{self, Resolution};
    use crate::txn::TransactionLedger;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn governed(router: Router, deadline: Duration) -> (Router, Arc<ServiceMetrics>) {
        let metrics = Arc::new(ServiceMetrics::new(ServiceKind::Social).unwrap());
        let governor = RequestGovernor::new(deadline, Arc::clone(&metrics));
        (router.layer(from_fn_with_state(governor, govern)), metrics)
    }

    fn get_req(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn slow_handler_times_out_with_408() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let router = Router::new().route(
            "/slow",
            get(move || {
                let flag = Arc::clone(&flag);
                async move {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    flag.store(true, Ordering::SeqCst);
                    "done"
                }
            }),
        );
        let (app, metrics) = governed(router, Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        let response = app.oneshot(get_req("/slow")).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(5));
        assert!(waited < Duration::from_secs(6));

        // The handler was dropped, not left running
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!finished.load(Ordering::SeqCst));
        assert_eq!(metrics.requests_by_code(), vec![(408, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_handler_passes_through() {
        let router = Router::new().route(
            "/fast",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                "ok"
            }),
        );
        let (app, metrics) = governed(router, Duration::from_secs(5));

        let response = app.oneshot(get_req("/fast")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(metrics.requests_by_code(), vec![(200, 1)]);
    }

    #[tokio::test]
    async fn error_statuses_are_counted() {
        let router = Router::new()
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route("/ok", get(|| async { "ok" }));
        let (app, metrics) = governed(router, Duration::from_secs(5));

        for uri in ["/ok", "/missing", "/ok"] {
            app.clone().oneshot(get_req(uri)).await.unwrap();
        }

        assert_eq!(metrics.requests_by_code(), vec![(200, 2), (404, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn commit_outliving_the_deadline_still_lands() {
        let journal = Journal::default();
        let ledger = Arc::new(TransactionLedger::new());
        let mut tx = FakeTx::new(9, &journal);
        tx.delay = Duration::from_secs(10);
        let token = ledger.open(tx);

        let router = Router::new().route(
            "/commit",
            get(move || {
                let ledger = Arc::clone(&ledger);
                async move {
                    match protocol::commit(&*ledger, &token).await {
                        Ok(()) => StatusCode::OK,
                        Err(_) => StatusCode::NOT_FOUND,
                    }
                }
            }),
        );
        let (app, metrics) = governed(router, Duration::from_secs(5));

        let first = app.clone().oneshot(get_req("/commit")).await.unwrap();
        assert_eq!(first.status(), StatusCode::REQUEST_TIMEOUT);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(journal.entries(), vec![(9, Resolution::Commit)]);

        let retry = app.oneshot(get_req("/commit")).await.unwrap();
        assert_eq!(retry.status(), StatusCode::NOT_FOUND);
        assert_eq!(metrics.requests_by_code(), vec![(404, 1), (408, 1)]);
    }
}
