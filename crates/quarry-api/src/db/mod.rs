//! # Database Layer
//!
//! Optional Postgres persistence. The API runs in-memory-only when no
//! `DATABASE_URL` is configured; when one is present, block writes go
//! through to the `stone_blocks` table and the store is hydrated from it
//! on startup.

pub mod blocks;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create a connection pool from `DATABASE_URL` and run migrations.
///
/// Returns `Ok(None)` when `DATABASE_URL` is unset (in-memory-only mode).
/// A set-but-unreachable database is an error: silently falling back to
/// in-memory would drop durability without anyone noticing.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            tracing::info!("DATABASE_URL not set — running in in-memory-only mode");
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("database pool initialized and migrations applied");
    Ok(Some(pool))
}
