//! In-memory record of every `(origin, url)` pair already stored.
//!
//! The cache is seeded from the database at startup and then grows with every
//! accepted submission, so a repeat submission can be answered without
//! touching SQLite and the number of genuinely new URLs is known up front.

use std::collections::HashSet;

use tracing::warn;

use crate::db::{ForumUrlRow, OtherUrlRow};
use crate::forum::ForumThread;

/// One stored pair. Thread pages are keyed by identity, so two origins that
/// differ only in their post anchor share entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Thread { thread: ForumThread, url: String },
    Origin { origin: String, url: String },
}

impl DedupKey {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Thread { url, .. } | Self::Origin { url, .. } => url,
        }
    }
}

#[derive(Debug, Default)]
pub struct DedupCache {
    seen: HashSet<DedupKey>,
}

impl DedupCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the cache from every stored row.
    ///
    /// Forum rows get their identity back by re-parsing `host + path_qs`. A row
    /// that no longer parses as a thread is logged and left out.
    #[must_use]
    pub fn rebuild(forum_rows: Vec<ForumUrlRow>, other_rows: Vec<OtherUrlRow>) -> Self {
        let mut cache = Self::new();

        for row in forum_rows {
            match ForumThread::from_row(&row.host, &row.path_qs) {
                Some(thread) => {
                    cache.add(DedupKey::Thread {
                        thread,
                        url: row.url,
                    });
                }
                None => {
                    warn!(host = %row.host, path_qs = %row.path_qs, "Stored row is not a forum thread, skipping");
                }
            }
        }

        for row in other_rows {
            cache.add(DedupKey::Origin {
                origin: row.origin,
                url: row.url,
            });
        }

        cache
    }

    #[must_use]
    pub fn contains(&self, key: &DedupKey) -> bool {
        self.seen.contains(key)
    }

    /// Record a stored pair. Returns `false` if it was already known.
    pub fn add(&mut self, key: DedupKey) -> bool {
        self.seen.insert(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
