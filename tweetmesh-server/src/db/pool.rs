//! Database connection pool management
//!
//! Every pending deferred transaction pins one pooled connection until it is
//! redeemed or reaped, so the pool must be sized for that on top of regular
//! request traffic.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

/// How long a handler waits for a free connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

/// Create a PostgreSQL connection pool from service configuration.
///
/// # Errors
///
/// Returns an error if the initial connection fails.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&config.database).await?;
/// ```
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p tweetmesh-server -- --ignored

    fn config_from_env(max_connections: u32) -> DatabaseConfig {
        DatabaseConfig {
            url: std::env::var("DATABASE_URL").expect("DATABASE_URL required"),
            max_connections,
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let pool = create_pool(&config_from_env(2)).await.expect("pool creation failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn open_transaction_pins_a_connection() {
        let pool = create_pool(&config_from_env(2)).await.expect("pool creation failed");

        let tx = pool.begin().await.expect("begin failed");
        assert_eq!(pool.size() - pool.num_idle() as u32, 1);

        tx.rollback().await.expect("rollback failed");
    }
}
