//! In-memory store implementations
//!
//! Used by unit tests and as the CLI fallback when no SQLite path is
//! configured. Maps live behind a single lock, which also serializes
//! same-key writes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use warden_core::{
    DownloadRecord, Hotspot, RiskLevel, SiteAction, SiteActionKind, Verdict, WebsiteNode,
};

use crate::traits::{GraphStore, HistoryStore, StoreError};

/// In-memory [`HistoryStore`]
#[derive(Default)]
pub struct MemoryHistoryStore {
    sites: Mutex<BTreeMap<String, Verdict>>,
    downloads: Mutex<Vec<DownloadRecord>>,
    actions: Mutex<Vec<SiteAction>>,
    fail: bool,
}

impl MemoryHistoryStore {
    /// A store whose every operation fails, for degradation tests.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn verdict(&self, url: &str) -> Option<Verdict> {
        self.sites.lock().get(url).cloned()
    }

    pub fn verdict_count(&self) -> usize {
        self.sites.lock().len()
    }

    pub fn downloads(&self) -> Vec<DownloadRecord> {
        self.downloads.lock().clone()
    }

    pub fn actions(&self) -> Vec<SiteAction> {
        self.actions.lock().clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail {
            Err(StoreError::Unavailable("memory store failing".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn upsert_verdict(
        &self,
        url: &str,
        level: RiskLevel,
        reason: &str,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut sites = self.sites.lock();
        match sites.get_mut(url) {
            Some(existing) => {
                existing.level = level;
                existing.reasons = vec![reason.to_string()];
                existing.visit_count += 1;
                existing.last_checked = Utc::now();
            }
            None => {
                sites.insert(
                    url.to_string(),
                    Verdict::new(url, level, vec![reason.to_string()]),
                );
            }
        }
        Ok(())
    }

    async fn append_download(
        &self,
        file: &str,
        site_url: Option<&str>,
        level: RiskLevel,
        reason: &str,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.downloads.lock().push(DownloadRecord {
            file: file.to_string(),
            site_url: site_url.map(String::from),
            risk: level,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn append_action(
        &self,
        url: &str,
        action: SiteActionKind,
        details: &str,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.actions.lock().push(SiteAction {
            url: url.to_string(),
            action,
            timestamp: Utc::now(),
            details: details.to_string(),
        });
        Ok(())
    }
}

/// In-memory [`GraphStore`]
#[derive(Default)]
pub struct MemoryGraphStore {
    nodes: Mutex<BTreeMap<String, WebsiteNode>>,
    fail: bool,
}

impl MemoryGraphStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.lock().len()
    }

    pub fn node(&self, url: &str) -> Option<WebsiteNode> {
        self.nodes.lock().get(url).cloned()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail {
            Err(StoreError::Unavailable("memory graph failing".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn upsert_node(
        &self,
        url: &str,
        label: &str,
        risk_score: i64,
        metadata: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut nodes = self.nodes.lock();
        match nodes.get_mut(url) {
            Some(node) => {
                node.label = label.to_string();
                node.risk_score = risk_score;
                node.last_updated = Utc::now();
                for (k, v) in metadata {
                    node.metadata.insert(k.clone(), v.clone());
                }
            }
            None => {
                nodes.insert(
                    url.to_string(),
                    WebsiteNode {
                        url: url.to_string(),
                        label: label.to_string(),
                        risk_score,
                        last_updated: Utc::now(),
                        metadata: metadata.clone(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn top_by_risk(&self, labels: &[&str], top_n: usize) -> Result<Vec<Hotspot>, StoreError> {
        self.check()?;
        let nodes = self.nodes.lock();
        let mut flagged: Vec<&WebsiteNode> = nodes
            .values()
            .filter(|n| labels.contains(&n.label.as_str()))
            .collect();
        // risk_score descending, url ascending as the stable tie-break
        flagged.sort_by(|a, b| b.risk_score.cmp(&a.risk_score).then(a.url.cmp(&b.url)));
        Ok(flagged
            .into_iter()
            .take(top_n)
            .map(|n| Hotspot {
                url: n.url.clone(),
                label: n.label.clone(),
                risk_score: n.risk_score,
                user_reports: 1,
                visits: 1,
            })
            .collect())
    }

    async fn flagged(&self, labels: &[&str], limit: usize) -> Result<Vec<String>, StoreError> {
        self.check()?;
        let nodes = self.nodes.lock();
        Ok(nodes
            .values()
            .filter(|n| labels.contains(&n.label.as_str()))
            .take(limit)
            .map(|n| n.url.clone())
            .collect())
    }
}
