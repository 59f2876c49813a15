//! Graph materialization and ranking
//!
//! Builds "website" nodes from cached domain indicators and answers the two
//! ranked/enumerated queries the dashboard layer consumes. Read paths
//! degrade to empty results when the store is unreachable; they never fail
//! the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use warden_core::{
    Hotspot, IndicatorKind, Relation, FEED_NODE_RISK_SCORE, FLAGGED_LABELS, RELATION_ACTOR,
    RELATION_LIMIT,
};
use warden_feeds::FeedCache;

use crate::traits::GraphStore;

/// Ranking layer over the flagged-website graph
pub struct GraphService {
    feeds: Arc<FeedCache>,
    store: Arc<dyn GraphStore>,
}

impl GraphService {
    pub fn new(feeds: Arc<FeedCache>, store: Arc<dyn GraphStore>) -> Self {
        Self { feeds, store }
    }

    /// Upsert one "risky" website node per cached domain indicator.
    ///
    /// Idempotent: merge-by-url semantics mean a second run over an
    /// unchanged snapshot changes no node counts. Returns the number of
    /// nodes upserted; per-node failures are logged and skipped.
    pub async fn materialize_from_feeds(&self) -> usize {
        let first_seen = Utc::now().to_rfc3339();
        let mut upserted = 0;

        for indicator in self.feeds.indicators(IndicatorKind::Domain) {
            let mut metadata = BTreeMap::new();
            metadata.insert("source".to_string(), serde_json::json!("threat_feed"));
            metadata.insert("first_seen".to_string(), serde_json::json!(first_seen));

            match self
                .store
                .upsert_node(&indicator.value, "risky", FEED_NODE_RISK_SCORE, &metadata)
                .await
            {
                Ok(()) => upserted += 1,
                Err(e) => {
                    warn!(url = %indicator.value, error = %e, "node upsert failed");
                }
            }
        }

        info!(upserted, "graph materialized from feeds");
        upserted
    }

    /// Top flagged nodes by risk score, tie-broken by url ascending.
    /// An unreachable store yields an empty list, never an error.
    pub async fn hotspots(&self, top_n: usize) -> Vec<Hotspot> {
        match self.store.top_by_risk(FLAGGED_LABELS, top_n).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "hotspot query failed, returning empty");
                Vec::new()
            }
        }
    }

    /// Up to 20 flagged nodes as synthetic-actor relation tuples.
    pub async fn relations(&self) -> Vec<Relation> {
        match self.store.flagged(FLAGGED_LABELS, RELATION_LIMIT).await {
            Ok(urls) => urls
                .iter()
                .map(|url| Relation::flagged(RELATION_ACTOR, url))
                .collect(),
            Err(e) => {
                warn!(error = %e, "relation query failed, returning empty");
                Vec::new()
            }
        }
    }
}
