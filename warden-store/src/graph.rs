//! Neo4j-backed flagged-website graph
//!
//! MERGE-by-url upserts and the two ranked/enumerated read queries. The
//! ranking order (`risk_score DESC, url ASC`) matches the in-memory store
//! so hotspot tie-breaks are identical across adapters.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use neo4rs::{query, ConfigBuilder, Graph};
use tracing::{debug, info, warn};

use warden_core::{Hotspot, Neo4jConfig};
use warden_engine::{GraphStore, StoreError};

/// Neo4j implementation of [`GraphStore`]
pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    /// Connect and verify the endpoint answers a trivial query.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, StoreError> {
        let graph_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .fetch_size(500)
            .max_connections(10)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let graph = Graph::connect(graph_config)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut stream = graph
            .execute(query("RETURN 1 AS ok"))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        while stream
            .next()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .is_some()
        {}

        info!(uri = %config.uri, "connected to graph store");
        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn upsert_node(
        &self,
        url: &str,
        label: &str,
        risk_score: i64,
        metadata: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), StoreError> {
        let mut cypher = String::from(
            "MERGE (w:Website {url: $url})
             SET w.label = $label,
                 w.risk_score = $risk_score,
                 w.last_updated = $last_updated",
        );

        let mut meta_params: Vec<(String, String)> = Vec::new();
        for (key, value) in metadata {
            if !is_identifier(key) {
                warn!(key, "skipping non-identifier metadata key");
                continue;
            }
            let param = format!("meta_{}", meta_params.len());
            cypher.push_str(&format!(", w.{key} = ${param}"));
            let rendered = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            meta_params.push((param, rendered));
        }

        let mut q = query(&cypher)
            .param("url", url)
            .param("label", label)
            .param("risk_score", risk_score)
            .param("last_updated", Utc::now().to_rfc3339());
        for (param, value) in meta_params {
            q = q.param(&param, value);
        }

        self.graph
            .run(q)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        debug!(url, label, risk_score, "website node upserted");
        Ok(())
    }

    async fn top_by_risk(&self, labels: &[&str], top_n: usize) -> Result<Vec<Hotspot>, StoreError> {
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        let q = query(
            "MATCH (w:Website)
             WHERE w.label IN $labels
             RETURN w.url AS url, w.label AS label, w.risk_score AS risk_score,
                    1 AS user_reports, 1 AS visits
             ORDER BY w.risk_score DESC, w.url ASC
             LIMIT $n",
        )
        .param("labels", labels)
        .param("n", top_n as i64);

        let mut stream = self
            .graph
            .execute(q)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut rows = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
        {
            rows.push(Hotspot {
                url: row.get("url").unwrap_or_default(),
                label: row.get("label").unwrap_or_default(),
                risk_score: row.get("risk_score").unwrap_or(0),
                user_reports: row.get("user_reports").unwrap_or(1),
                visits: row.get("visits").unwrap_or(1),
            });
        }
        Ok(rows)
    }

    async fn flagged(&self, labels: &[&str], limit: usize) -> Result<Vec<String>, StoreError> {
        let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        let q = query(
            "MATCH (w:Website)
             WHERE w.label IN $labels
             RETURN w.url AS url
             ORDER BY w.url ASC
             LIMIT $n",
        )
        .param("labels", labels)
        .param("n", limit as i64);

        let mut stream = self
            .graph
            .execute(q)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut urls = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
        {
            let url: String = row.get("url").unwrap_or_default();
            if !url.is_empty() {
                urls.push(url);
            }
        }
        Ok(urls)
    }
}

fn is_identifier(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !key.starts_with(|c: char| c.is_ascii_digit())
}
