//! URL classifier: short-circuit tiered evaluation
//!
//! Strict tier order, first qualifying tier wins:
//! 1. Indicator match against cached domain/IP feeds -> Risky, with every
//!    matching indicator contributing a reason
//! 2. Suspicious extension substring or over-length URL -> Unknown
//! 3. Default -> Trusted

use std::collections::BTreeSet;

use warden_core::{
    Indicator, RiskLevel, SUSPICIOUS_URL_EXTENSIONS, URL_LENGTH_THRESHOLD,
};

/// Reason used when the heuristic tier fires
pub const HEURISTIC_REASON: &str = "Unknown site, suspicious download or link pattern";

/// Reason used when nothing fires
pub const TRUSTED_REASON: &str = "Site is not flagged in any threat feeds";

/// Outcome of a pure evaluation, before any persistence side effect
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub level: RiskLevel,
    pub reasons: Vec<String>,
}

/// Evaluate a lowercased URL against the cached indicator sets.
///
/// Pure function of (input, snapshot): identical inputs against an identical
/// snapshot always produce the same level and reasons.
pub fn evaluate_url(
    url: &str,
    domains: &BTreeSet<Indicator>,
    ips: &BTreeSet<Indicator>,
) -> Evaluation {
    let mut reasons = Vec::new();

    for indicator in domains {
        if url.contains(&indicator.value) {
            reasons.push(format!(
                "Domain listed in {} feed ({})",
                indicator.source, indicator.value
            ));
        }
    }
    for indicator in ips {
        if url.contains(&indicator.value) {
            reasons.push(format!(
                "IP listed in {} feed ({})",
                indicator.source, indicator.value
            ));
        }
    }

    if !reasons.is_empty() {
        return Evaluation {
            level: RiskLevel::Risky,
            reasons,
        };
    }

    // Length is counted in characters, not bytes, so non-ASCII URLs are
    // held to the same threshold.
    let suspicious = SUSPICIOUS_URL_EXTENSIONS.iter().any(|ext| url.contains(ext))
        || url.chars().count() > URL_LENGTH_THRESHOLD;
    if suspicious {
        return Evaluation {
            level: RiskLevel::Unknown,
            reasons: vec![HEURISTIC_REASON.to_string()],
        };
    }

    Evaluation {
        level: RiskLevel::Trusted,
        reasons: vec![TRUSTED_REASON.to_string()],
    }
}
