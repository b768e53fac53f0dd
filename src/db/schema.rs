use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Create the URL tables if they do not exist yet.
///
/// The unique constraints carry the same key shape as the in-memory dedup
/// cache: `(host, name, id, page, url)` for thread pages and `(origin, url)`
/// for everything else.
pub async fn init(pool: &SqlitePool) -> Result<()> {
    debug!("Creating forum_threads table");
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS forum_threads (
            host TEXT NOT NULL,
            name TEXT NOT NULL,
            id INTEGER NOT NULL,
            page INTEGER NOT NULL DEFAULT 1,
            post INTEGER,
            path_qs TEXT NOT NULL,
            url TEXT NOT NULL,
            date TEXT NOT NULL,
            UNIQUE(host, name, id, page, url)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create forum_threads table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_forum_threads_thread ON forum_threads(host, name, id)",
    )
    .execute(pool)
    .await
    .context("Failed to create forum_threads index")?;

    debug!("Creating other_urls table");
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS other_urls (
            origin TEXT NOT NULL,
            url TEXT NOT NULL,
            date TEXT NOT NULL,
            UNIQUE(origin, url)
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create other_urls table")?;

    Ok(())
}
