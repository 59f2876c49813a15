//! The scoring engine facade
//!
//! Wires the evaluators to the feed cache and the history store. Every
//! classification computes its verdict first and persists second; a store
//! failure is logged with context and the verdict is still returned.

use std::sync::Arc;

use tracing::{debug, info, warn};

use warden_core::{EmailAssessment, IndicatorKind, RiskLevel, SiteActionKind, Verdict};
use warden_feeds::FeedCache;

use crate::email::assess_email;
use crate::file::evaluate_file;
use crate::traits::{HistoryStore, StoreError};
use crate::url::evaluate_url;

/// Deterministic rule-based scorer over the cached feed snapshot
pub struct ScoringEngine {
    feeds: Arc<FeedCache>,
    history: Arc<dyn HistoryStore>,
}

impl ScoringEngine {
    pub fn new(feeds: Arc<FeedCache>, history: Arc<dyn HistoryStore>) -> Self {
        Self { feeds, history }
    }

    /// Classify a URL. Always also a write: the URL's verdict is upserted
    /// (visit count +1, level/reason overwritten). An empty input is Trusted
    /// by policy and skips the upsert, since there is no subject to key it.
    pub async fn classify_url(&self, url: &str) -> Verdict {
        let url = url.trim().to_lowercase();
        if url.is_empty() {
            debug!("empty url input, trusted by policy");
            return Verdict::new(
                "",
                RiskLevel::Trusted,
                vec![crate::url::TRUSTED_REASON.to_string()],
            );
        }

        let domains = self.feeds.indicators(IndicatorKind::Domain);
        let ips = self.feeds.indicators(IndicatorKind::Ip);
        let eval = evaluate_url(&url, &domains, &ips);
        let verdict = Verdict::new(&url, eval.level, eval.reasons);

        info!(
            url = %verdict.subject,
            level = verdict.level.label(),
            reason = %verdict.reason(),
            "url classified"
        );
        self.persist_verdict(&verdict.subject, verdict.level, &verdict.reason())
            .await;
        verdict
    }

    /// Classify a downloaded file. Appends a download record regardless of
    /// origin; when an origin URL is supplied, that URL's verdict is also
    /// upserted with the file's level/reason, keeping the persisted sites
    /// row in step with what the user last downloaded from it.
    pub async fn classify_file(&self, file: &str, origin_url: Option<&str>) -> Verdict {
        let file = file.trim().to_lowercase();
        if file.is_empty() {
            debug!("empty file input, trusted by policy");
            return Verdict::new(
                "",
                RiskLevel::Trusted,
                vec![crate::file::CLEAN_FILE_REASON.to_string()],
            );
        }

        let eval = evaluate_file(&file);
        let verdict = Verdict::new(&file, eval.level, eval.reasons);
        let reason = verdict.reason();

        info!(
            file = %verdict.subject,
            origin = origin_url.unwrap_or("-"),
            level = verdict.level.label(),
            "file classified"
        );

        // Normalized once so the sites and downloads tables agree on the key
        let origin = origin_url
            .map(|u| u.trim().to_lowercase())
            .filter(|u| !u.is_empty());
        if let Some(origin) = &origin {
            self.persist_verdict(origin, verdict.level, &reason).await;
        }
        if let Err(e) = self
            .history
            .append_download(&verdict.subject, origin.as_deref(), verdict.level, &reason)
            .await
        {
            warn!(file = %verdict.subject, error = %e, "download record append failed");
        }

        verdict
    }

    /// Assess an email body. Read-only; no persistence side effect.
    pub fn assess_email(&self, text: &str) -> EmailAssessment {
        let assessment = assess_email(text);
        debug!(
            score = assessment.score,
            phishing = assessment.phishing,
            "email assessed"
        );
        assessment
    }

    /// Record a user report/override action. Unlike classification, this is
    /// itself the write, so adapter failures surface to the caller.
    pub async fn record_action(
        &self,
        url: &str,
        action: SiteActionKind,
        details: &str,
    ) -> Result<(), StoreError> {
        info!(url, action = action.as_str(), "site action recorded");
        self.history.append_action(url, action, details).await
    }

    async fn persist_verdict(&self, url: &str, level: RiskLevel, reason: &str) {
        if let Err(e) = self.history.upsert_verdict(url, level, reason).await {
            warn!(url, error = %e, "verdict upsert failed, classification unaffected");
        }
    }
}
