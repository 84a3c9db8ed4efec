//! Registry-resolved fan-out to peer services
//!
//! - `client`: resolve a service type to endpoints, self-register at startup
//! - `aggregator`: ask the first resolved peer for related ids
//!
//! Known limitation: the first endpoint returned by the registry is used for
//! every call; there is no load balancing and no health checking.

pub mod aggregator;
pub mod client;

pub use aggregator::FollowingsAggregator;
pub use client::{DiscoveryClient, Endpoint, Registration};

/// Discovery and peer-call error type
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Registry unreachable, non-success status, or unreadable answer
    #[error("discovery registry unavailable: {0}")]
    Unavailable(String),

    /// Registry knows no instance of the requested type
    #[error("no provider registered for service type '{service_type}'")]
    NoProvider { service_type: String },

    /// Peer call failed or returned a non-success status
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Self-registration rejected or failed
    #[error("registration failed: {0}")]
    Registration(String),
}
