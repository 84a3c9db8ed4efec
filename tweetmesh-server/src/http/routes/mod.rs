//! Route handlers organized by resource

pub mod metrics;
pub mod sessions;
pub mod status;
pub mod tweets;
pub mod users;
