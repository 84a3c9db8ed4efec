//! Axum server setup
//!
//! Bootstrap order for one service process:
//! 1. connect the pool and run migrations
//! 2. bind the listener and register with the discovery registry (fatal)
//! 3. start the deferred-session reaper (content service)
//! 4. serve until Ctrl+C / SIGTERM
//! 5. stop the reaper and roll back whatever is still pending

use std::sync::Arc;
use std::time::Duration;

use axum::middleware::from_fn_with_state;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::governor::{govern, RequestGovernor};
use super::metrics::ServiceMetrics;
use super::routes;
use crate::config::{ServiceConfig, ServiceKind};
use crate::db::{create_pool, migrations};
use crate::discovery::{DiscoveryClient, DiscoveryError, Registration};
use crate::txn::{reaper, PgTransaction, ReaperConfig, TransactionLedger};

/// Shared application state
pub struct AppState {
    pub kind: ServiceKind,
    pub pool: PgPool,
    /// Pending deferred transactions (always empty on the social service)
    pub ledger: Arc<TransactionLedger<PgTransaction>>,
    pub discovery: DiscoveryClient,
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(
        kind: ServiceKind,
        pool: PgPool,
        discovery: DiscoveryClient,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            kind,
            pool,
            ledger: Arc::new(TransactionLedger::new()),
            discovery,
            metrics: Arc::new(ServiceMetrics::new(kind)?),
        })
    }
}

/// Build the router for `state.kind`, governed by `deadline`.
pub fn build_router(state: Arc<AppState>, deadline: Duration) -> Router {
    let governor = RequestGovernor::new(deadline, Arc::clone(&state.metrics));

    let common = Router::new()
        .merge(routes::status::router())
        .merge(routes::metrics::router());

    let app = match state.kind {
        ServiceKind::Content => common
            .merge(routes::tweets::router())
            .merge(routes::sessions::router()),
        ServiceKind::Social => common.merge(routes::users::router()),
    };

    app.layer(from_fn_with_state(governor, govern))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run one service until a shutdown signal arrives.
pub async fn run_service(config: ServiceConfig) -> Result<(), ServerError> {
    let kind = config.kind;

    let pool = create_pool(&config.database).await?;
    migrations::run(&pool, kind).await?;
    tracing::info!(service = %kind, "Database ready");

    let discovery = DiscoveryClient::new(&config.registry, config.request_timeout)?;
    let state = Arc::new(AppState::new(kind, pool, discovery)?);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(service = %kind, "Server listening on {}", config.bind_addr);

    state
        .discovery
        .register(&Registration {
            service_type: kind.service_type().to_owned(),
            service_host: config.advertised_host.clone(),
            service_port: config.advertised_port,
        })
        .await?;

    let reaper = match kind {
        ServiceKind::Content => Some(reaper::spawn(
            Arc::clone(&state.ledger),
            ReaperConfig {
                max_age: config.pending_tx_max_age,
                interval: config.reaper_interval,
            },
        )),
        ServiceKind::Social => None,
    };

    let app = build_router(Arc::clone(&state), config.request_timeout);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = reaper {
        handle.abort();
    }
    let rolled_back = reaper::drain(&state.ledger).await;
    if rolled_back > 0 {
        tracing::warn!(rolled_back, "Pending sessions rolled back at shutdown");
    }

    state.pool.close().await;
    tracing::info!(service = %kind, "Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}
