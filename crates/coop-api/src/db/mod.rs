//! # Database Persistence Layer
//!
//! Optional Postgres persistence via SQLx.
//!
//! When a database URL is configured, every entity write is mirrored to the
//! `records` table (one JSONB document per record, keyed by kind and id) and
//! footsteps are appended to the `footsteps` hash chain. Without one, the API
//! runs in in-memory-only mode, which is what tests use.

pub mod footsteps;
pub mod records;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the connection pool and run migrations.
///
/// Returns `None` when `database_url` is unset (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::warn!(
            "DATABASE_URL not set, running in-memory only mode. \
             State will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_url_means_in_memory_mode() {
        assert!(init_pool(None).await.unwrap().is_none());
    }
}
