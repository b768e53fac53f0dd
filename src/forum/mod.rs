//! Forum thread URL classification.
//!
//! Origin URLs are sorted into two buckets: pages of a forum thread, which
//! get a structured [`ForumThread`] identity, and everything else.

mod thread;

pub use thread::ForumThread;

use url::Url;

/// Outcome of classifying an origin URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The URL is a page of a forum thread.
    Thread(ForumThread),
    /// Anything else; stored under the origin URL itself.
    Generic,
}

/// Classify a parsed URL as a forum thread page or a generic page.
#[must_use]
pub fn classify(url: &Url) -> Classification {
    ForumThread::from_url(url).map_or(Classification::Generic, Classification::Thread)
}
