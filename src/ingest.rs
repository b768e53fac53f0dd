//! Submission and retrieval of URLs keyed by their origin page.

use std::collections::BTreeSet;

use anyhow::Context;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::db::{self, Database};
use crate::dedup::{DedupCache, DedupKey};
use crate::forum::{classify, Classification};

/// Default cap on URLs accepted in a single submission.
pub const DEFAULT_MAX_URLS_PER_SUBMISSION: usize = 10_000;

#[derive(Debug, Error)]
pub enum IngestError {
    /// The caller sent something unusable.
    #[error("invalid input '{input}': {reason}")]
    Validation { input: String, reason: String },
    /// SQLite failed underneath us.
    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl IngestError {
    fn validation(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

impl From<anyhow::Error> for IngestError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err)
    }
}

/// Parse and check an origin URL.
///
/// # Errors
///
/// Returns [`IngestError::Validation`] unless the input is an absolute
/// `http`/`https` URL with a host.
pub fn parse_origin(origin: &str) -> Result<Url, IngestError> {
    let origin = origin.trim();
    let url = Url::parse(origin).map_err(|e| IngestError::validation(origin, e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(IngestError::validation(
            origin,
            "only http and https URLs are accepted",
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(IngestError::validation(origin, "URL has no host"));
    }

    Ok(url)
}

/// Stores submitted URLs against their origin and answers lookups.
///
/// Holds the dedup cache; every submission runs its cache check, database
/// writes and cache update under one lock.
pub struct IngestService {
    db: Database,
    seen: Mutex<DedupCache>,
    max_urls: usize,
}

impl IngestService {
    /// Seed the dedup cache from the database.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Storage`] if the stored rows cannot be read.
    pub async fn new(db: Database) -> Result<Self, IngestError> {
        let forum_rows = db::get_all_forum_rows(db.pool()).await?;
        let other_rows = db::get_all_other_rows(db.pool()).await?;
        let (forum_count, other_count) = (forum_rows.len(), other_rows.len());

        let cache = DedupCache::rebuild(forum_rows, other_rows);
        info!(
            forum_rows = forum_count,
            other_rows = other_count,
            entries = cache.len(),
            "Dedup cache rebuilt"
        );

        Ok(Self {
            db,
            seen: Mutex::new(cache),
            max_urls: DEFAULT_MAX_URLS_PER_SUBMISSION,
        })
    }

    #[must_use]
    pub fn with_max_urls(mut self, max_urls: usize) -> Self {
        self.max_urls = max_urls;
        self
    }

    /// Store `urls` under `origin`, returning how many were not stored before.
    ///
    /// Blank entries are dropped and the rest are sorted and deduplicated. All
    /// writes share one transaction; the cache only learns about them once it
    /// has committed.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`] for a bad origin or an oversized
    /// batch, and [`IngestError::Storage`] if the transaction fails.
    pub async fn submit(&self, origin: &str, urls: &[String]) -> Result<usize, IngestError> {
        let origin_url = parse_origin(origin)?;
        if urls.len() > self.max_urls {
            return Err(IngestError::validation(
                origin,
                format!(
                    "{} urls submitted, at most {} are accepted",
                    urls.len(),
                    self.max_urls
                ),
            ));
        }

        let urls: BTreeSet<&str> = urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect();

        let classification = classify(&origin_url);
        let keys: Vec<DedupKey> = urls
            .into_iter()
            .map(|url| match &classification {
                Classification::Thread(thread) => DedupKey::Thread {
                    thread: thread.clone(),
                    url: url.to_string(),
                },
                Classification::Generic => DedupKey::Origin {
                    origin: origin_url.to_string(),
                    url: url.to_string(),
                },
            })
            .collect();

        let display_origin = match &classification {
            Classification::Thread(thread) => thread.url(),
            Classification::Generic => origin_url.to_string(),
        };

        let mut seen = self.seen.lock().await;
        let date = Utc::now().to_rfc3339();
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .context("Failed to begin submission transaction")?;

        let mut added = 0;
        let mut written = Vec::with_capacity(keys.len());
        for key in keys {
            if seen.contains(&key) {
                debug!(origin = %display_origin, url = key.url(), "Skipped known url");
                continue;
            }

            let inserted = match &key {
                DedupKey::Thread { thread, url } => {
                    db::insert_forum_url(&mut *tx, thread, url, &date).await?
                }
                DedupKey::Origin { origin, url } => {
                    db::insert_other_url(&mut *tx, origin, url, &date).await?
                }
            };

            if inserted {
                added += 1;
            } else {
                debug!(origin = %display_origin, url = key.url(), "Already stored, cache resynced");
            }
            written.push(key);
        }

        tx.commit()
            .await
            .context("Failed to commit submission transaction")?;

        for key in written {
            seen.add(key);
        }

        info!(origin = %display_origin, new_urls = added, "Added {added} url(s)");
        Ok(added)
    }

    /// Look up the URLs stored for `origin`.
    ///
    /// For a forum thread, `page` narrows the result to that page and takes
    /// precedence over the page in the origin URL; `None` returns every page.
    /// For other origins `page` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`] for a bad origin or a page of 0, and
    /// [`IngestError::Storage`] if the query fails.
    pub async fn retrieve(
        &self,
        origin: &str,
        page: Option<u32>,
    ) -> Result<Vec<String>, IngestError> {
        let origin_url = parse_origin(origin)?;
        if page == Some(0) {
            return Err(IngestError::validation("0", "page must be at least 1"));
        }

        let urls = match classify(&origin_url) {
            Classification::Thread(thread) => {
                db::get_forum_thread_urls(self.db.pool(), &thread, page).await?
            }
            Classification::Generic => db::get_other_urls(self.db.pool(), origin_url.as_str()).await?,
        };

        debug!(origin = %origin_url, ?page, count = urls.len(), "Retrieved urls");
        Ok(urls)
    }

    /// Number of `(origin, url)` pairs currently known to the dedup cache.
    pub async fn known_pairs(&self) -> usize {
        self.seen.lock().await.len()
    }
}
