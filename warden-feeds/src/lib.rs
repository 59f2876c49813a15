//! Warden Feeds - threat feed fetching and local snapshot cache
//!
//! The feed cache:
//! - Fetches newline-delimited indicator lists over HTTP with bounded retries
//! - Normalizes and deduplicates entries per indicator kind
//! - Persists one cache file per feed, written atomically
//! - Serves the last-known-good snapshot when a refresh fails (fail-open)
//!
//! Scoring never touches the network: it reads only the last-committed
//! snapshot, so a hanging feed source cannot block classification.

pub mod cache;
pub mod fetch;

pub use cache::{FeedCache, FeedOutcome, FeedStatus, RefreshResult};
pub use fetch::{fetch_feed, FeedError};
