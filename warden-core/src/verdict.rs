//! Risk verdicts and persistence records
//!
//! A verdict is the current classification state for one URL: last-write-wins
//! on level/reasons, visit count accumulates. Download records and site
//! actions are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discrete risk level for a classified subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Trusted,
    Unknown,
    Risky,
}

impl RiskLevel {
    /// Persisted label, matching the sites table convention.
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Trusted => "trusted",
            RiskLevel::Unknown => "unknown",
            RiskLevel::Risky => "risky",
        }
    }

    /// Numeric score: trusted=0, unknown=1, risky=2.
    pub fn as_i64(&self) -> i64 {
        match self {
            RiskLevel::Trusted => 0,
            RiskLevel::Unknown => 1,
            RiskLevel::Risky => 2,
        }
    }
}

/// Classification state for one URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// The classified subject (lowercased URL or file name)
    pub subject: String,
    /// Current risk level
    pub level: RiskLevel,
    /// Reasons behind the level, in match order
    pub reasons: Vec<String>,
    /// Times this subject has been classified
    pub visit_count: u64,
    /// When the verdict was last computed
    pub last_checked: DateTime<Utc>,
}

impl Verdict {
    pub fn new(subject: &str, level: RiskLevel, reasons: Vec<String>) -> Self {
        Self {
            subject: subject.to_string(),
            level,
            reasons,
            visit_count: 1,
            last_checked: Utc::now(),
        }
    }

    /// Reasons joined for display and persistence.
    pub fn reason(&self) -> String {
        self.reasons.join("; ")
    }
}

/// Append-only record of one file classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub file: String,
    /// Origin URL if the download source was known
    pub site_url: Option<String>,
    pub risk: RiskLevel,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// User-driven actions on a site, kept as an audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteActionKind {
    /// User reported the site as suspicious
    Report,
    /// User overrode a warning and proceeded
    Override,
}

impl SiteActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteActionKind::Report => "report",
            SiteActionKind::Override => "override",
        }
    }
}

/// One audit trail entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteAction {
    pub url: String,
    pub action: SiteActionKind,
    pub timestamp: DateTime<Utc>,
    pub details: String,
}

/// Confidence tier of an email assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    LowSuspicion,
    Safe,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High confidence",
            Confidence::Medium => "Medium confidence",
            Confidence::LowSuspicion => "Low suspicion - review recommended",
            Confidence::Safe => "Safe",
        }
    }
}

/// Result of running the additive email rule set over a message body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailAssessment {
    /// Whether the accumulated score crossed the phishing threshold
    pub phishing: bool,
    pub confidence: Confidence,
    /// Accumulated rule weight
    pub score: u32,
    /// Reasons from every rule that matched, in table order
    pub reasons: Vec<String>,
}

impl EmailAssessment {
    pub fn reason(&self) -> String {
        self.reasons.join(" | ")
    }
}
