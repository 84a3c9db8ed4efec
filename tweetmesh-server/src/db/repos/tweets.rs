//! Tweet repository
//!
//! Timelines are single queries: one owner (`=`) or a set of owners
//! (`= ANY($1)`), newest first.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};

use super::DbError;
use crate::models::TweetContent;

/// Tweet record from database
#[derive(Debug, Clone, FromRow)]
pub struct Tweet {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Tweet repository
pub struct TweetRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TweetRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a tweet and return the stored row.
    pub async fn create(&self, user_id: i32, content: &TweetContent) -> Result<Tweet, DbError> {
        let tweet = sqlx::query_as(
            r#"
            INSERT INTO tweets (user_id, content)
            VALUES ($1, $2)
            RETURNING id, user_id, content, created_at
            "#,
        )
        .bind(user_id)
        .bind(content.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(tweet)
    }

    /// Delete a single tweet immediately.
    pub async fn delete(&self, id: i32) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("tweet", id));
        }
        Ok(())
    }

    /// Tweets written by one user.
    pub async fn list_by_owner(&self, user_id: i32) -> Result<Vec<Tweet>, DbError> {
        let tweets = sqlx::query_as(
            r#"
            SELECT id, user_id, content, created_at
            FROM tweets
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(tweets)
    }

    /// Tweets written by any of `user_ids`.
    ///
    /// An empty id set short-circuits to an empty result without a round trip.
    pub async fn list_by_owners(&self, user_ids: &[i32]) -> Result<Vec<Tweet>, DbError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tweets = sqlx::query_as(
            r#"
            SELECT id, user_id, content, created_at
            FROM tweets
            WHERE user_id = ANY($1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(tweets)
    }

    /// Delete every tweet of `user_id` on a caller-owned connection.
    ///
    /// Used by the deferred deletion path: the rows disappear inside the
    /// caller's transaction and only become durable on commit.
    pub async fn delete_by_owner_in(conn: &mut PgConnection, user_id: i32) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM tweets WHERE user_id = $1")
            .bind(user_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}
