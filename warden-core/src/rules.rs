//! Weighted phishing rule table for email analysis
//!
//! Unlike the URL/file classifiers (short-circuit, first tier wins), email
//! rules are additive: every matching rule contributes its weight and reason
//! to the accumulated score. The two strategies are deliberately kept
//! separate; they have different tie-break semantics.

use std::sync::LazyLock;

use regex::Regex;

/// Rule weight tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleWeight {
    High,
    Medium,
    Low,
}

impl RuleWeight {
    /// Score contribution: high=3, medium=2, low=1.
    pub fn value(&self) -> u32 {
        match self {
            RuleWeight::High => 3,
            RuleWeight::Medium => 2,
            RuleWeight::Low => 1,
        }
    }
}

/// How a rule decides whether it matches
enum Matcher {
    /// Plain regex search over the whole text
    Pattern(Regex),
    /// Sender address whose TLD is outside the common set
    SenderDomain,
}

/// One entry in the email rule table
pub struct EmailRule {
    pub name: &'static str,
    pub reason: &'static str,
    pub weight: RuleWeight,
    matcher: Matcher,
}

impl EmailRule {
    pub fn matches(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Pattern(re) => re.is_match(text),
            Matcher::SenderDomain => has_suspicious_sender(text),
        }
    }
}

/// The fixed, ordered email rule table.
///
/// The grammar rule is case-sensitive on purpose: its third alternative
/// detects CamelCase-style letter runs, which would match any word of three
/// letters under a case-insensitive flag.
pub static EMAIL_RULES: LazyLock<Vec<EmailRule>> = LazyLock::new(|| {
    vec![
        EmailRule {
            name: "urgency_tactic",
            reason: "Creates false urgency with action demand",
            weight: RuleWeight::High,
            matcher: Matcher::Pattern(
                Regex::new(
                    r"(?i)\b(urgent|immediate|asap|emergency)\b.*\b(click|link|update|verify|confirm)\b",
                )
                .unwrap(),
            ),
        },
        EmailRule {
            name: "prize_scam",
            reason: "Too-good-to-be-true offer",
            weight: RuleWeight::High,
            matcher: Matcher::Pattern(
                Regex::new(
                    r"(?i)\b(win|won|prize|reward|million|billion)\b.*\b(claim|collect|money|cash)\b",
                )
                .unwrap(),
            ),
        },
        EmailRule {
            name: "account_threat",
            reason: "Threatens account suspension",
            weight: RuleWeight::High,
            matcher: Matcher::Pattern(
                Regex::new(
                    r"(?i)\b(account|bank|paypal|amazon)\b.*\b(suspend|closed|terminate|verify)\b",
                )
                .unwrap(),
            ),
        },
        EmailRule {
            name: "credential_request",
            reason: "Requests credential verification",
            weight: RuleWeight::Medium,
            matcher: Matcher::Pattern(
                Regex::new(r"(?i)\b(login|sign.in|password|credentials)\b.*\b(verify|update|confirm)\b")
                    .unwrap(),
            ),
        },
        EmailRule {
            name: "suspicious_sender",
            reason: "Suspicious sender domain",
            weight: RuleWeight::Medium,
            matcher: Matcher::SenderDomain,
        },
        EmailRule {
            name: "generic_greeting",
            reason: "Generic greeting instead of personal name",
            weight: RuleWeight::Low,
            matcher: Matcher::Pattern(
                Regex::new(r"(?i)^\s*(dear customer|dear user|valued customer|dear account holder)")
                    .unwrap(),
            ),
        },
        EmailRule {
            name: "poor_grammar",
            reason: "Poor grammar or excessive punctuation",
            weight: RuleWeight::Low,
            matcher: Matcher::Pattern(
                Regex::new(r"!!+|\?\?+|[A-Z][a-z]*[A-Z][a-z]*[A-Z]").unwrap(),
            ),
        },
    ]
});

/// Score added when an embedded URL matches a suspicious hostname shape
pub const SUSPICIOUS_URL_WEIGHT: u32 = 2;

/// Reason attached for the embedded-URL check
pub const SUSPICIOUS_URL_REASON: &str = "Suspicious URL detected";

static EMBEDDED_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://([a-zA-Z0-9.-]+)").unwrap());

static SUSPICIOUS_HOST_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)security-?verify").unwrap(),
        Regex::new(r"(?i)login-?update").unwrap(),
        Regex::new(r"(?i)account-?confirm").unwrap(),
        Regex::new(r"(?i)\.(tk|ml|ga|cf)$").unwrap(),
    ]
});

static SENDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9.-]+\.[A-Za-z]{2,})").unwrap());

/// TLDs considered ordinary for sender addresses
const COMMON_SENDER_TLDS: &[&str] = &["com", "org", "net", "edu", "gov"];

/// True when any `http(s)` URL in the text has a suspicious hostname shape.
pub fn has_suspicious_url(text: &str) -> bool {
    EMBEDDED_URL_REGEX.captures_iter(text).any(|cap| {
        let host = &cap[1];
        SUSPICIOUS_HOST_REGEXES.iter().any(|re| re.is_match(host))
    })
}

/// True when the text carries an address whose TLD is outside the common set.
pub fn has_suspicious_sender(text: &str) -> bool {
    SENDER_REGEX.captures_iter(text).any(|cap| {
        let host = cap[1].to_lowercase();
        match host.rsplit('.').next() {
            Some(tld) => !COMMON_SENDER_TLDS.contains(&tld),
            None => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str) -> &'static EmailRule {
        EMAIL_RULES.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn test_urgency_rule() {
        assert!(rule("urgency_tactic").matches("Urgent: please click the link below"));
        assert!(!rule("urgency_tactic").matches("see you at the meeting tomorrow"));
    }

    #[test]
    fn test_prize_rule() {
        assert!(rule("prize_scam").matches("You won a prize! Claim your cash now"));
    }

    #[test]
    fn test_account_threat_rule() {
        assert!(rule("account_threat").matches("your bank account will be suspended"));
    }

    #[test]
    fn test_generic_greeting_anchored() {
        assert!(rule("generic_greeting").matches("Dear Customer, your parcel is waiting"));
        assert!(!rule("generic_greeting").matches("Hello. Dear customer mentions elsewhere"));
    }

    #[test]
    fn test_poor_grammar_rule() {
        assert!(rule("poor_grammar").matches("act now!!"));
        assert!(rule("poor_grammar").matches("PayPalService notice"));
        assert!(!rule("poor_grammar").matches("just a normal sentence."));
    }

    #[test]
    fn test_suspicious_url_detection() {
        assert!(has_suspicious_url("visit http://security-verify-bank.com now"));
        assert!(has_suspicious_url("see https://example.tk/path"));
        assert!(!has_suspicious_url("see https://example.com/login"));
        assert!(!has_suspicious_url("no urls here"));
    }

    #[test]
    fn test_suspicious_sender_detection() {
        assert!(has_suspicious_sender("from: alerts@secure-mail.xyz"));
        assert!(!has_suspicious_sender("from: alerts@example.com"));
        assert!(!has_suspicious_sender("no address"));
    }

    #[test]
    fn test_rule_weights() {
        assert_eq!(RuleWeight::High.value(), 3);
        assert_eq!(RuleWeight::Medium.value(), 2);
        assert_eq!(RuleWeight::Low.value(), 1);
    }
}
