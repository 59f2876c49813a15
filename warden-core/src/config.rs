//! Engine configuration
//!
//! One immutable configuration value, constructed at startup (defaults or a
//! TOML file) and passed into the feed cache and scoring engine. There is no
//! ambient global state; thresholds and feed URLs live here or in the rule
//! constants, never in mutable statics.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::IndicatorKind;

/// Errors from configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One configured indicator feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Feed name, used as the cache file stem and indicator source
    pub name: String,
    /// Fetch URL; empty for static feeds
    #[serde(default)]
    pub url: String,
    /// Indicator kind the feed carries
    pub kind: IndicatorKind,
    /// Intended refresh interval in seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Static entries for feeds without a fetch URL (e.g. suspicious TLDs)
    #[serde(default)]
    pub entries: Vec<String>,
}

impl FeedConfig {
    /// Static feeds refresh from their entry list, never the network.
    pub fn is_static(&self) -> bool {
        self.url.is_empty()
    }
}

/// Retry and timeout policy for feed fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchPolicy {
    /// Attempts per feed per refresh cycle
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Fixed delay between attempts, in seconds
    #[serde(default = "default_backoff")]
    pub backoff_secs: u64,
    /// Per-attempt request timeout, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            backoff_secs: default_backoff(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Neo4j connection settings for the graph store adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

/// Top-level configuration value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Directory for normalized feed cache files
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default)]
    pub fetch: FetchPolicy,
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
    /// SQLite database path for verdict history; None = in-memory fallback
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,
    /// Neo4j endpoint for the graph store; None = graph commands unavailable
    #[serde(default)]
    pub neo4j: Option<Neo4jConfig>,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            fetch: FetchPolicy::default(),
            feeds: default_feeds(),
            sqlite_path: None,
            neo4j: None,
        }
    }
}

impl WardenConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Feeds that are enabled for refresh.
    pub fn enabled_feeds(&self) -> impl Iterator<Item = &FeedConfig> {
        self.feeds.iter().filter(|f| f.enabled)
    }
}

fn default_true() -> bool {
    true
}

fn default_retries() -> u32 {
    3
}

fn default_backoff() -> u64 {
    1
}

fn default_timeout() -> u64 {
    10
}

fn default_refresh_interval() -> u64 {
    3600
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/feeds")
}

/// The default feed set: abuse.ch botnet IPs, OpenPhish domains, the
/// malwaredomains mirror, and a static suspicious-TLD list.
fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig {
            name: "malware_ips".into(),
            url: "https://feodotracker.abuse.ch/downloads/ipblocklist.txt".into(),
            kind: IndicatorKind::Ip,
            refresh_interval_secs: 3600,
            enabled: true,
            entries: Vec::new(),
        },
        FeedConfig {
            name: "phishing_domains".into(),
            url: "https://openphish.com/feed.txt".into(),
            kind: IndicatorKind::Domain,
            refresh_interval_secs: 1800,
            enabled: true,
            entries: Vec::new(),
        },
        FeedConfig {
            name: "malware_domains".into(),
            url: "https://mirror1.malwaredomains.com/files/justdomains".into(),
            kind: IndicatorKind::Domain,
            refresh_interval_secs: 86400,
            enabled: true,
            entries: Vec::new(),
        },
        FeedConfig {
            name: "suspicious_tlds".into(),
            url: String::new(),
            kind: IndicatorKind::Tld,
            refresh_interval_secs: 86400,
            enabled: true,
            entries: [".tk", ".ml", ".ga", ".cf", ".xyz", ".top", ".gq"]
                .into_iter()
                .map(String::from)
                .collect(),
        },
    ]
}
