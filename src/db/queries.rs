use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};

use super::models::{ForumUrlRow, OtherUrlRow};
use crate::forum::ForumThread;

// ========== Forum Threads ==========

/// Insert a URL found on a forum thread page.
///
/// Uses INSERT OR IGNORE so a repeat of `(host, name, id, page, url)` is a
/// no-op. Returns whether a row was actually written.
pub async fn insert_forum_url(
    conn: &mut SqliteConnection,
    thread: &ForumThread,
    url: &str,
    date: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r"
        INSERT OR IGNORE INTO forum_threads (host, name, id, page, post, path_qs, url, date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(thread.host())
    .bind(thread.name())
    .bind(thread.id())
    .bind(i64::from(thread.page()))
    .bind(thread.post_number())
    .bind(thread.path_qs())
    .bind(url)
    .bind(date)
    .execute(&mut *conn)
    .await
    .context("Failed to insert forum thread url")?;

    Ok(result.rows_affected() == 1)
}

/// Get the URLs stored for a thread.
///
/// With `page` set only that page is returned, otherwise every page of the
/// thread. Rows come back in insertion order.
pub async fn get_forum_thread_urls(
    pool: &SqlitePool,
    thread: &ForumThread,
    page: Option<u32>,
) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = match page {
        Some(page) => sqlx::query_as::<_, (String,)>(
            r"
            SELECT url FROM forum_threads
            WHERE host = ? AND name = ? AND id = ? AND page = ?
            ORDER BY rowid
            ",
        )
        .bind(thread.host())
        .bind(thread.name())
        .bind(thread.id())
        .bind(i64::from(page))
        .fetch_all(pool)
        .await,
        None => sqlx::query_as::<_, (String,)>(
            r"
            SELECT url FROM forum_threads
            WHERE host = ? AND name = ? AND id = ?
            ORDER BY rowid
            ",
        )
        .bind(thread.host())
        .bind(thread.name())
        .bind(thread.id())
        .fetch_all(pool)
        .await,
    }
    .context("Failed to fetch forum thread urls")?;

    Ok(rows.into_iter().map(|(url,)| url).collect())
}

/// Get every stored forum thread row.
pub async fn get_all_forum_rows(pool: &SqlitePool) -> Result<Vec<ForumUrlRow>> {
    sqlx::query_as(
        "SELECT host, name, id, page, post, path_qs, url, date FROM forum_threads ORDER BY rowid",
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch forum thread rows")
}

/// Count stored forum thread URLs.
pub async fn count_forum_urls(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM forum_threads")
        .fetch_one(pool)
        .await
        .context("Failed to count forum thread urls")?;
    Ok(row.0)
}

// ========== Other URLs ==========

/// Insert a URL found on a page that is not a forum thread.
///
/// Returns whether a row was actually written.
pub async fn insert_other_url(
    conn: &mut SqliteConnection,
    origin: &str,
    url: &str,
    date: &str,
) -> Result<bool> {
    let result = sqlx::query("INSERT OR IGNORE INTO other_urls (origin, url, date) VALUES (?, ?, ?)")
        .bind(origin)
        .bind(url)
        .bind(date)
        .execute(&mut *conn)
        .await
        .context("Failed to insert other url")?;

    Ok(result.rows_affected() == 1)
}

/// Get the URLs stored for a generic origin, in insertion order.
pub async fn get_other_urls(pool: &SqlitePool, origin: &str) -> Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT url FROM other_urls WHERE origin = ? ORDER BY rowid")
            .bind(origin)
            .fetch_all(pool)
            .await
            .context("Failed to fetch other urls")?;

    Ok(rows.into_iter().map(|(url,)| url).collect())
}

/// Get every stored generic row.
pub async fn get_all_other_rows(pool: &SqlitePool) -> Result<Vec<OtherUrlRow>> {
    sqlx::query_as("SELECT origin, url, date FROM other_urls ORDER BY rowid")
        .fetch_all(pool)
        .await
        .context("Failed to fetch other url rows")
}

/// Count stored generic URLs.
pub async fn count_other_urls(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM other_urls")
        .fetch_one(pool)
        .await
        .context("Failed to count other urls")?;
    Ok(row.0)
}
