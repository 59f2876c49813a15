//! Threat indicators and feed snapshots
//!
//! Indicators are single malicious values (an IP, a domain, a TLD) sourced
//! from an external feed. A snapshot is the immutable, timestamped result of
//! one refresh cycle for one feed; a new fetch replaces the prior indicator
//! set for its source wholesale.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kinds of threat indicator a feed can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    /// IPv4 address
    Ip,
    /// Domain name
    Domain,
    /// Top-level domain suffix (e.g. ".tk")
    Tld,
}

impl IndicatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Ip => "ip",
            IndicatorKind::Domain => "domain",
            IndicatorKind::Tld => "tld",
        }
    }
}

/// A single indicator value with its provenance
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Indicator {
    /// The indicator value (lowercased, trimmed)
    pub value: String,
    /// What the value denotes
    pub kind: IndicatorKind,
    /// Name of the feed that supplied it
    pub source: String,
}

/// The cached result of one feed refresh cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Feed name this snapshot belongs to
    pub source: String,
    /// Indicator kind the feed carries
    pub kind: IndicatorKind,
    /// Deduplicated, normalized indicator values
    pub indicators: BTreeSet<String>,
    /// When the content was last successfully fetched
    pub fetched_at: DateTime<Utc>,
    /// True when the latest refresh attempt failed and this content is
    /// carried over from the last successful fetch (or empty if none)
    pub stale: bool,
    /// Content digest of the normalized indicator list
    pub digest: String,
}

impl FeedSnapshot {
    /// Build a fresh snapshot from normalized values.
    pub fn new(source: &str, kind: IndicatorKind, indicators: BTreeSet<String>) -> Self {
        let digest = digest_values(&indicators);
        Self {
            source: source.to_string(),
            kind,
            indicators,
            fetched_at: Utc::now(),
            stale: false,
            digest,
        }
    }

    /// An empty stale snapshot for a feed that has never fetched successfully.
    pub fn empty_stale(source: &str, kind: IndicatorKind) -> Self {
        let mut snap = Self::new(source, kind, BTreeSet::new());
        snap.stale = true;
        snap
    }

    /// The snapshot's values as full indicators.
    pub fn to_indicators(&self) -> BTreeSet<Indicator> {
        self.indicators
            .iter()
            .map(|v| Indicator {
                value: v.clone(),
                kind: self.kind,
                source: self.source.clone(),
            })
            .collect()
    }
}

/// Digest of a normalized value set, used to detect unchanged feeds.
pub fn digest_values(values: &BTreeSet<String>) -> String {
    let mut hasher = Sha256::new();
    for v in values {
        hasher.update(v.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())[..16].to_string()
}

/// Normalize raw feed text into a deduplicated value set for the given kind.
///
/// Lines are trimmed and lowercased; comment lines (leading `#`) and blanks
/// are dropped. IP feeds keep only dotted-quad-shaped tokens, domain feeds
/// require a `.`, and TLD entries must start with `.`.
pub fn normalize_feed(raw: &str, kind: IndicatorKind) -> BTreeSet<String> {
    raw.lines()
        .filter_map(|line| normalize_line(line, kind))
        .collect()
}

fn normalize_line(line: &str, kind: IndicatorKind) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let value = line.to_lowercase();
    match kind {
        IndicatorKind::Ip => looks_like_ipv4(&value).then_some(value),
        IndicatorKind::Domain => value.contains('.').then_some(value),
        IndicatorKind::Tld => value.starts_with('.').then_some(value),
    }
}

/// Syntactic dotted-quad check: four all-numeric octets in 0-255.
pub fn looks_like_ipv4(value: &str) -> bool {
    let octets: Vec<&str> = value.split('.').collect();
    octets.len() == 4
        && octets.iter().all(|o| {
            !o.is_empty() && o.len() <= 3 && o.chars().all(|c| c.is_ascii_digit())
                && o.parse::<u16>().map(|n| n <= 255).unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ip_feed() {
        let raw = "# Feodo Tracker blocklist\n1.2.3.4\n\n  5.6.7.8  \nnot-an-ip\n999.1.1.1\n";
        let values = normalize_feed(raw, IndicatorKind::Ip);
        assert_eq!(values.len(), 2);
        assert!(values.contains("1.2.3.4"));
        assert!(values.contains("5.6.7.8"));
    }

    #[test]
    fn test_normalize_domain_feed() {
        let raw = "# comment\nEvil.Example.COM\nlocalhost\nphish.test\nphish.test\n";
        let values = normalize_feed(raw, IndicatorKind::Domain);
        assert_eq!(values.len(), 2);
        assert!(values.contains("evil.example.com"));
        assert!(values.contains("phish.test"));
    }

    #[test]
    fn test_normalize_tld_entries() {
        let raw = ".tk\n.ml\ntk\n";
        let values = normalize_feed(raw, IndicatorKind::Tld);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_looks_like_ipv4() {
        assert!(looks_like_ipv4("192.168.1.1"));
        assert!(!looks_like_ipv4("192.168.1"));
        assert!(!looks_like_ipv4("192.168.1.256"));
        assert!(!looks_like_ipv4("a.b.c.d"));
        assert!(!looks_like_ipv4("1.2.3.4.5"));
    }

    #[test]
    fn test_snapshot_digest_stable() {
        let a = normalize_feed("b.com\na.com\n", IndicatorKind::Domain);
        let b = normalize_feed("a.com\nb.com\n", IndicatorKind::Domain);
        assert_eq!(digest_values(&a), digest_values(&b));
    }

    #[test]
    fn test_empty_stale_snapshot() {
        let snap = FeedSnapshot::empty_stale("openphish", IndicatorKind::Domain);
        assert!(snap.stale);
        assert!(snap.indicators.is_empty());
    }
}
