//! Persistence adapter contracts
//!
//! The engine requires exactly these operations; connection pooling, schema,
//! and indexing belong to the adapter implementations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use warden_core::{Hotspot, RiskLevel, SiteActionKind};

/// Errors from persistence adapters
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Verdict history and audit persistence.
///
/// Implementations must serialize writes to the same URL key so concurrent
/// classifications cannot lose visit-count increments.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Idempotent per-URL verdict upsert: visit count +1, level and reason
    /// overwritten (last-write-wins).
    async fn upsert_verdict(&self, url: &str, level: RiskLevel, reason: &str)
        -> Result<(), StoreError>;

    /// Append one immutable download record.
    async fn append_download(
        &self,
        file: &str,
        site_url: Option<&str>,
        level: RiskLevel,
        reason: &str,
    ) -> Result<(), StoreError>;

    /// Append one immutable site action audit entry.
    async fn append_action(
        &self,
        url: &str,
        action: SiteActionKind,
        details: &str,
    ) -> Result<(), StoreError>;
}

/// Flagged-website graph persistence and ranked queries.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Merge-by-url node upsert: label/risk_score/last_updated overwritten,
    /// metadata keys merged.
    async fn upsert_node(
        &self,
        url: &str,
        label: &str,
        risk_score: i64,
        metadata: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), StoreError>;

    /// Nodes whose label is in `labels`, ordered by risk score descending
    /// then url ascending, truncated to `top_n`.
    async fn top_by_risk(&self, labels: &[&str], top_n: usize) -> Result<Vec<Hotspot>, StoreError>;

    /// URLs of up to `limit` flagged nodes.
    async fn flagged(&self, labels: &[&str], limit: usize) -> Result<Vec<String>, StoreError>;
}
