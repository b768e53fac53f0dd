mod models;
mod queries;
mod schema;

pub use models::*;
pub use queries::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file and make sure both URL tables exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails, the schema cannot be created,
    /// or the file is not writable.
    pub async fn new(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            // Submissions are serialized in-process, but retrievals still read
            // while a submission transaction is open.
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        let db = Self { pool };
        schema::init(&db.pool).await?;
        info!("Database schema ready");
        db.verify_writable(path).await?;

        Ok(db)
    }

    async fn verify_writable(&self, path: &Path) -> Result<()> {
        // A deferred BEGIN takes no write lock, so only a real write shows a
        // read-only volume before the first submission does.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin SQLite writability check")?;

        for statement in [
            "CREATE TABLE IF NOT EXISTS _write_check (id INTEGER)",
            "DROP TABLE _write_check",
        ] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .with_context(|| {
                    format!(
                        "SQLite database is not writable (path: {}). Check volume mount permissions/ownership",
                        path.display()
                    )
                })?;
        }

        tx.commit()
            .await
            .context("Failed to commit SQLite writability check")?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
