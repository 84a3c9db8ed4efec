//! Request payload models with validation at construction
//!
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod tweet;
pub mod user;

pub use validation::ValidationError;
pub use tweet::TweetContent;
pub use user::{Password, Username};
