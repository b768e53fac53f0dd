//! Forum link ledger library.
//!
//! Records the URLs found on web pages, keyed by the page they were found on.
//! Forum thread pages are recognized and keyed by thread identity and page
//! number so that repeat submissions are stored once.

pub mod config;
pub mod db;
pub mod dedup;
pub mod forum;
pub mod ingest;
pub mod web;
