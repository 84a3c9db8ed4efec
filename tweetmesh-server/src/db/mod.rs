//! Database layer - connection pool, schema, repositories
//!
//! # Design Principles
//!
//! - Connection pool with an acquire timeout - no Arc<Mutex<Connection>>
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Statements that must run inside a caller-owned transaction take
//!   `&mut PgConnection` instead of the pool

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::create_pool;
pub use repos::*;
