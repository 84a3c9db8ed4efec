//! tweetmesh-server: content and social-graph HTTP services
//!
//! Two small services share this library:
//! - **content** (`tweet`): tweets, timelines and deferred owner deletions
//!   whose transaction stays open across requests until committed or rolled
//!   back by session token
//! - **social** (`user`): users and follow edges
//!
//! Each service registers itself with a discovery registry at startup and
//! resolves its peers through it on every cross-service call.

pub mod config;
pub mod db;
pub mod discovery;
pub mod http;
pub mod models;
pub mod txn;

pub use config::{ConfigError, ServiceConfig, ServiceKind};
pub use http::{build_router, run_service, AppState, ServerError};
