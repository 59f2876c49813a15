//! Graph node model for the flagged-website graph
//!
//! Nodes are keyed by URL; re-materialization overwrites label, risk score,
//! and last_updated and merges metadata keys (idempotent upsert, never
//! insert-or-fail).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A website node with risk metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteNode {
    pub url: String,
    /// Risk label: trusted / unknown / suspicious / risky / malicious
    pub label: String,
    pub risk_score: i64,
    pub last_updated: DateTime<Utc>,
    /// Free-form properties; merged key-by-key on upsert
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// One row of the ranked hotspot query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotspot {
    pub url: String,
    pub label: String,
    pub risk_score: i64,
    pub user_reports: i64,
    pub visits: i64,
}

/// One flagged-relation tuple with the synthetic actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub actor: String,
    pub url: String,
    pub relation: String,
}

impl Relation {
    pub fn flagged(actor: &str, url: &str) -> Self {
        Self {
            actor: actor.to_string(),
            url: url.to_string(),
            relation: "flagged".to_string(),
        }
    }
}
