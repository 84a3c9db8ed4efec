//! User and follow-edge repository

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::{is_unique_violation, DbError};
use crate::models::{Password, Username};

/// User record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password: String,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register a user; a taken username is a `Conflict`.
    pub async fn register(&self, username: &Username, password: &Password) -> Result<User, DbError> {
        sqlx::query_as(
            r#"
            INSERT INTO users (username, password)
            VALUES ($1, $2)
            RETURNING id, username, password
            "#,
        )
        .bind(username.as_str())
        .bind(password.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DbError::Conflict("Username already registered".to_owned())
            } else {
                DbError::Sqlx(e)
            }
        })
    }

    /// Get a user by id.
    pub async fn get(&self, id: i32) -> Result<User, DbError> {
        sqlx::query_as("SELECT id, username, password FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("user", id))
    }

    /// Record that `follower_id` follows `followed_id` (idempotent).
    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO followings (follower_id, followed_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, followed_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove a follow edge; missing edge is `NotFound`.
    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<(), DbError> {
        let result = sqlx::query(
            "DELETE FROM followings WHERE follower_id = $1 AND followed_id = $2",
        )
        .bind(follower_id)
        .bind(followed_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "follow",
                format!("{} -> {}", follower_id, followed_id),
            ));
        }
        Ok(())
    }

    /// Ids of the users `user_id` follows.
    pub async fn followings(&self, user_id: i32) -> Result<Vec<i32>, DbError> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            "SELECT followed_id FROM followings WHERE follower_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Ids of the users following `user_id`.
    pub async fn followers(&self, user_id: i32) -> Result<Vec<i32>, DbError> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            "SELECT follower_id FROM followings WHERE followed_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
