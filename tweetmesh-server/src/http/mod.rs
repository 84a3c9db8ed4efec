//! HTTP server layer
//!
//! Axum server with:
//! - Request deadline and outcome counting (governor)
//! - Request tracing
//! - Graceful shutdown
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod governor;
pub mod metrics;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use governor::RequestGovernor;
pub use metrics::ServiceMetrics;
pub use server::{build_router, run_service, AppState, ServerError};
