//! The feed cache
//!
//! Holds one snapshot per configured feed, in memory and on disk. Refresh
//! builds a replacement snapshot fully before swapping it in under a short
//! write lock, so concurrent readers always observe either the old or the
//! new snapshot, never a partial one. Cache files are written to a temp
//! file and renamed into place for the same reason.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use reqwest::Client;
use tracing::{debug, info, warn};

use warden_core::{
    digest_values, normalize_feed, FeedConfig, FeedSnapshot, FetchPolicy, Indicator,
    IndicatorKind, WardenConfig,
};

use crate::fetch::{build_client, fetch_feed, FeedError};

/// Maximum feeds fetched concurrently during one refresh cycle
const MAX_CONCURRENT_FETCHES: usize = 4;

/// Per-feed outcome of one refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Fetch succeeded and the snapshot content changed
    Updated,
    /// Fetch succeeded with identical content; disk write skipped
    Unchanged,
    /// All attempts failed; prior snapshot kept and marked stale
    Stale,
}

/// One feed's result within a [`RefreshResult`]
#[derive(Debug, Clone)]
pub struct FeedOutcome {
    pub feed: String,
    pub status: FeedStatus,
    pub indicator_count: usize,
}

/// Summary of one refresh cycle. Per-feed failures never surface as errors;
/// they appear here as `Stale` outcomes.
#[derive(Debug, Clone, Default)]
pub struct RefreshResult {
    pub outcomes: Vec<FeedOutcome>,
}

impl RefreshResult {
    pub fn updated(&self) -> usize {
        self.count(FeedStatus::Updated)
    }

    pub fn stale(&self) -> usize {
        self.count(FeedStatus::Stale)
    }

    fn count(&self, status: FeedStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Local cache of normalized threat feed snapshots
pub struct FeedCache {
    feeds: Vec<FeedConfig>,
    policy: FetchPolicy,
    cache_dir: PathBuf,
    client: Client,
    snapshots: RwLock<HashMap<String, Arc<FeedSnapshot>>>,
}

impl FeedCache {
    /// Create a cache from configuration, loading any existing cache files.
    /// Missing files are not an error; those feeds start empty.
    pub fn new(config: &WardenConfig) -> Result<Self, FeedError> {
        let client = build_client(&config.fetch)?;
        let cache = Self {
            feeds: config.feeds.clone(),
            policy: config.fetch.clone(),
            cache_dir: config.cache_dir.clone(),
            client,
            snapshots: RwLock::new(HashMap::new()),
        };
        cache.load_from_disk();
        Ok(cache)
    }

    fn load_from_disk(&self) {
        for feed in &self.feeds {
            let path = self.cache_path(&feed.name);
            let Ok(raw) = fs::read_to_string(&path) else {
                continue;
            };
            let fetched_at = file_mtime(&path).unwrap_or_else(Utc::now);
            let values = normalize_feed(&raw, feed.kind);
            let mut snapshot = FeedSnapshot::new(&feed.name, feed.kind, values);
            snapshot.fetched_at = fetched_at;
            debug!(
                feed = %feed.name,
                indicators = snapshot.indicators.len(),
                "loaded cached feed snapshot"
            );
            self.snapshots
                .write()
                .insert(feed.name.clone(), Arc::new(snapshot));
        }
    }

    /// Refresh every enabled feed. Static feeds rebuild from their entry
    /// list; fetchable feeds go through the bounded-retry download. Always
    /// returns Ok-shaped data: failures degrade to stale snapshots.
    pub async fn refresh(&self) -> RefreshResult {
        let mut result = RefreshResult::default();

        // Static feeds need no network round trip.
        for feed in self.feeds.iter().filter(|f| f.enabled && f.is_static()) {
            let raw = feed.entries.join("\n");
            let status = self.apply_success(feed, &raw);
            result.outcomes.push(self.outcome(feed, status));
        }

        let fetchable: Vec<FeedConfig> = self
            .feeds
            .iter()
            .filter(|f| f.enabled && !f.is_static())
            .cloned()
            .collect();

        let bodies: Vec<(FeedConfig, Result<String, FeedError>)> = stream::iter(fetchable)
            .map(|feed| {
                let client = self.client.clone();
                let policy = self.policy.clone();
                async move {
                    let body = fetch_feed(&client, &feed.url, &policy).await;
                    (feed, body)
                }
            })
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

        for (feed, body) in bodies {
            let feed = &feed;
            let status = match body {
                Ok(raw) => self.apply_success(feed, &raw),
                Err(e) => {
                    warn!(feed = %feed.name, error = %e, "feed refresh failed, keeping prior snapshot");
                    self.apply_failure(feed);
                    FeedStatus::Stale
                }
            };
            result.outcomes.push(self.outcome(feed, status));
        }

        info!(
            updated = result.updated(),
            stale = result.stale(),
            total = result.outcomes.len(),
            "feed refresh cycle complete"
        );
        result
    }

    /// Union of all cached indicators of the requested kind. Never fails;
    /// feeds without a cache contribute nothing.
    pub fn indicators(&self, kind: IndicatorKind) -> BTreeSet<Indicator> {
        let snapshots = self.snapshots.read();
        snapshots
            .values()
            .filter(|s| s.kind == kind)
            .flat_map(|s| s.to_indicators())
            .collect()
    }

    /// Current snapshot for one feed, if any.
    pub fn snapshot(&self, feed: &str) -> Option<Arc<FeedSnapshot>> {
        self.snapshots.read().get(feed).cloned()
    }

    fn outcome(&self, feed: &FeedConfig, status: FeedStatus) -> FeedOutcome {
        let indicator_count = self
            .snapshot(&feed.name)
            .map(|s| s.indicators.len())
            .unwrap_or(0);
        FeedOutcome {
            feed: feed.name.clone(),
            status,
            indicator_count,
        }
    }

    /// Normalize a successful fetch and swap the snapshot in. Skips the
    /// disk write when the content digest is unchanged.
    fn apply_success(&self, feed: &FeedConfig, raw: &str) -> FeedStatus {
        let values = normalize_feed(raw, feed.kind);
        let digest = digest_values(&values);

        let unchanged = self
            .snapshot(&feed.name)
            .map(|prior| !prior.stale && prior.digest == digest)
            .unwrap_or(false);

        if !unchanged {
            if let Err(e) = self.write_atomic(&feed.name, &values) {
                // A failed disk write still leaves the in-memory snapshot
                // usable; the cache file catches up on the next cycle.
                warn!(feed = %feed.name, error = %e, "cache file write failed");
            }
        }

        let snapshot = FeedSnapshot::new(&feed.name, feed.kind, values);
        debug!(
            feed = %feed.name,
            indicators = snapshot.indicators.len(),
            unchanged,
            "feed snapshot refreshed"
        );
        self.snapshots
            .write()
            .insert(feed.name.clone(), Arc::new(snapshot));

        if unchanged {
            FeedStatus::Unchanged
        } else {
            FeedStatus::Updated
        }
    }

    /// Keep the last-known-good snapshot and mark it stale. A feed that has
    /// never fetched successfully gets an empty stale snapshot.
    fn apply_failure(&self, feed: &FeedConfig) {
        let mut snapshots = self.snapshots.write();
        let replacement = match snapshots.get(&feed.name) {
            Some(prior) => {
                let mut kept = (**prior).clone();
                kept.stale = true;
                kept
            }
            None => FeedSnapshot::empty_stale(&feed.name, feed.kind),
        };
        snapshots.insert(feed.name.clone(), Arc::new(replacement));
    }

    fn cache_path(&self, feed: &str) -> PathBuf {
        self.cache_dir.join(format!("{feed}.txt"))
    }

    fn write_atomic(&self, feed: &str, values: &BTreeSet<String>) -> Result<(), FeedError> {
        let path = self.cache_path(feed);
        let io_err = |source: std::io::Error| FeedError::CacheIo {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(&self.cache_dir).map_err(io_err)?;

        let mut content = values.iter().cloned().collect::<Vec<_>>().join("\n");
        content.push('\n');

        let tmp = path.with_extension("txt.tmp");
        fs::write(&tmp, content).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        Ok(())
    }
}

fn file_mtime(path: &std::path::Path) -> Option<DateTime<Utc>> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use warden_core::WardenConfig;

    fn test_config(dir: &TempDir) -> WardenConfig {
        let mut config = WardenConfig::default();
        config.cache_dir = dir.path().to_path_buf();
        config
    }

    fn feed_by_name<'a>(cache: &'a FeedCache, name: &str) -> &'a FeedConfig {
        cache.feeds.iter().find(|f| f.name == name).unwrap()
    }

    #[test]
    fn test_empty_cache_serves_empty_sets() {
        let dir = TempDir::new().unwrap();
        let cache = FeedCache::new(&test_config(&dir)).unwrap();
        assert!(cache.indicators(IndicatorKind::Ip).is_empty());
        assert!(cache.indicators(IndicatorKind::Domain).is_empty());
    }

    #[test]
    fn test_apply_success_writes_and_swaps() {
        let dir = TempDir::new().unwrap();
        let cache = FeedCache::new(&test_config(&dir)).unwrap();
        let feed = feed_by_name(&cache, "phishing_domains").clone();

        let status = cache.apply_success(&feed, "# header\nEvil.Example\nphish.test\n");
        assert_eq!(status, FeedStatus::Updated);

        let snap = cache.snapshot("phishing_domains").unwrap();
        assert!(!snap.stale);
        assert_eq!(snap.indicators.len(), 2);
        assert!(snap.indicators.contains("evil.example"));

        let on_disk = fs::read_to_string(dir.path().join("phishing_domains.txt")).unwrap();
        assert!(on_disk.contains("phish.test"));
        // No leftover temp file after the rename
        assert!(!dir.path().join("phishing_domains.txt.tmp").exists());
    }

    #[test]
    fn test_unchanged_content_is_detected() {
        let dir = TempDir::new().unwrap();
        let cache = FeedCache::new(&test_config(&dir)).unwrap();
        let feed = feed_by_name(&cache, "phishing_domains").clone();

        assert_eq!(cache.apply_success(&feed, "a.test\nb.test\n"), FeedStatus::Updated);
        // Same content in a different order is still unchanged
        assert_eq!(cache.apply_success(&feed, "b.test\na.test\n"), FeedStatus::Unchanged);
        assert_eq!(cache.apply_success(&feed, "c.test\n"), FeedStatus::Updated);
    }

    #[test]
    fn test_failure_keeps_last_known_good() {
        let dir = TempDir::new().unwrap();
        let cache = FeedCache::new(&test_config(&dir)).unwrap();
        let feed = feed_by_name(&cache, "malware_ips").clone();

        cache.apply_success(&feed, "1.2.3.4\n5.6.7.8\n");
        cache.apply_failure(&feed);

        let snap = cache.snapshot("malware_ips").unwrap();
        assert!(snap.stale);
        assert_eq!(snap.indicators.len(), 2);
        assert!(snap.indicators.contains("1.2.3.4"));
    }

    #[test]
    fn test_failure_without_prior_snapshot_is_empty_stale() {
        let dir = TempDir::new().unwrap();
        let cache = FeedCache::new(&test_config(&dir)).unwrap();
        let feed = feed_by_name(&cache, "malware_ips").clone();

        cache.apply_failure(&feed);
        let snap = cache.snapshot("malware_ips").unwrap();
        assert!(snap.stale);
        assert!(snap.indicators.is_empty());
        assert!(cache.indicators(IndicatorKind::Ip).is_empty());
    }

    #[test]
    fn test_reload_from_disk() {
        let dir = TempDir::new().unwrap();
        {
            let cache = FeedCache::new(&test_config(&dir)).unwrap();
            let feed = feed_by_name(&cache, "phishing_domains").clone();
            cache.apply_success(&feed, "evil.example.com\n");
        }
        // A new cache instance picks up the persisted snapshot
        let cache = FeedCache::new(&test_config(&dir)).unwrap();
        let domains = cache.indicators(IndicatorKind::Domain);
        assert!(domains.iter().any(|i| i.value == "evil.example.com"));
    }

    #[tokio::test]
    async fn test_refresh_failure_never_errors() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.fetch.retries = 1;
        config.fetch.backoff_secs = 0;
        config.fetch.timeout_secs = 1;
        // Unroutable endpoints: every fetch attempt fails
        for feed in config.feeds.iter_mut().filter(|f| !f.is_static()) {
            feed.url = "http://127.0.0.1:9/unreachable.txt".into();
        }

        let cache = FeedCache::new(&config).unwrap();
        let result = cache.refresh().await;

        assert_eq!(result.stale(), 3);
        for feed in ["malware_ips", "phishing_domains", "malware_domains"] {
            assert!(cache.snapshot(feed).unwrap().stale);
        }
        // The static TLD feed still refreshed
        let tlds = cache.snapshot("suspicious_tlds").unwrap();
        assert!(!tlds.stale);
        assert!(tlds.indicators.contains(".tk"));
    }

    #[tokio::test]
    async fn test_http_500_keeps_prior_snapshot_and_marks_stale() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        // Local server answering 500 to every attempt
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(
                        b"HTTP/1.1 500 Internal Server Error\r\n\
                          content-length: 0\r\nconnection: close\r\n\r\n",
                    )
                    .await;
            }
        });

        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.fetch.retries = 3;
        config.fetch.backoff_secs = 0;
        config.feeds.retain(|f| f.name == "phishing_domains");
        config.feeds[0].url = format!("http://{addr}/feed.txt");

        let cache = FeedCache::new(&config).unwrap();
        let feed = feed_by_name(&cache, "phishing_domains").clone();
        cache.apply_success(&feed, "evil.example.com\nphish.test\n");

        let result = cache.refresh().await;

        assert_eq!(result.stale(), 1);
        let snap = cache.snapshot("phishing_domains").unwrap();
        assert!(snap.stale);
        assert_eq!(snap.indicators.len(), 2);
        assert!(snap.indicators.contains("evil.example.com"));
        assert!(snap.indicators.contains("phish.test"));
    }

    #[tokio::test]
    async fn test_indicators_union_across_feeds() {
        let dir = TempDir::new().unwrap();
        let cache = FeedCache::new(&test_config(&dir)).unwrap();
        let phish = feed_by_name(&cache, "phishing_domains").clone();
        let malware = feed_by_name(&cache, "malware_domains").clone();

        cache.apply_success(&phish, "phish.test\nshared.test\n");
        cache.apply_success(&malware, "malware.test\nshared.test\n");

        let domains = cache.indicators(IndicatorKind::Domain);
        let values: BTreeSet<&str> = domains.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(values.len(), 3);
        // Same value from two sources keeps both provenances
        assert_eq!(
            domains.iter().filter(|i| i.value == "shared.test").count(),
            2
        );
    }
}
