//! Schema bootstrap for both services
//!
//! Each service owns its own database; tables are created idempotently at
//! startup.

use sqlx::PgPool;

use crate::config::ServiceKind;

/// Run the migrations belonging to `kind`
pub async fn run(pool: &PgPool, kind: ServiceKind) -> Result<(), sqlx::Error> {
    tracing::info!(service = %kind, "Running migrations...");

    match kind {
        ServiceKind::Content => content(pool).await?,
        ServiceKind::Social => social(pool).await?,
    }

    tracing::info!(service = %kind, "Migrations complete");
    Ok(())
}

async fn content(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tweets (
            id SERIAL PRIMARY KEY,
            user_id INTEGER NOT NULL,
            content VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tweets_user_id ON tweets(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn social(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            username VARCHAR(50) NOT NULL UNIQUE,
            password VARCHAR(50) NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS followings (
            id SERIAL PRIMARY KEY,
            follower_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            followed_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            UNIQUE (follower_id, followed_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_followings_followed ON followings(followed_id)")
        .execute(pool)
        .await?;

    Ok(())
}
