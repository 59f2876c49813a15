//! Warden Core - domain model for threat signal aggregation
//!
//! This crate provides the foundational primitives:
//! - Threat indicators (IPs, domains, TLDs) and feed snapshots
//! - Risk verdicts, download records, and site action audit entries
//! - Website graph nodes, hotspot rows, and relation tuples
//! - Weighted phishing rule tables for email analysis
//! - Immutable engine configuration

pub mod config;
pub mod graph;
pub mod indicators;
pub mod rules;
pub mod verdict;

pub use config::*;
pub use graph::*;
pub use indicators::*;
pub use rules::*;
pub use verdict::*;

/// URL substrings that mark a download-like or packed payload
pub const SUSPICIOUS_URL_EXTENSIONS: &[&str] = &[".exe", ".zip", ".apk"];

/// URLs longer than this are treated as suspicious link patterns
pub const URL_LENGTH_THRESHOLD: usize = 60;

/// File extensions classified as risky outright (suffix match, first wins)
pub const RISKY_FILE_EXTENSIONS: &[&str] = &[".exe", ".apk", ".scr", ".bat", ".js", ".wsf"];

/// Archive markers that downgrade a file to "treat with caution"
pub const ARCHIVE_MARKERS: &[&str] = &[".zip", ".rar"];

/// Email score at or above which phishing is reported with high confidence
pub const PHISHING_HIGH_THRESHOLD: u32 = 5;

/// Email score at or above which phishing is reported with medium confidence
pub const PHISHING_MEDIUM_THRESHOLD: u32 = 3;

/// Email score at or above which a non-phishing mail is flagged for review
pub const PHISHING_REVIEW_THRESHOLD: u32 = 2;

/// Graph node labels considered flagged for hotspot/relation queries
pub const FLAGGED_LABELS: &[&str] = &["suspicious", "risky", "malicious"];

/// Risk score assigned to websites materialized from threat feeds
pub const FEED_NODE_RISK_SCORE: i64 = 7;

/// Upper bound on rows returned by the flagged-relations query
pub const RELATION_LIMIT: usize = 20;

/// Synthetic actor name used in the placeholder relation model
pub const RELATION_ACTOR: &str = "Warden";
