//! Email classifier: additive weighted accumulation
//!
//! Every rule in the table that matches contributes its weight and reason;
//! an embedded URL with a suspicious hostname shape adds a fixed bonus. The
//! final tier comes from the accumulated score, not from any single rule.

use warden_core::{
    has_suspicious_url, Confidence, EmailAssessment, EMAIL_RULES, PHISHING_HIGH_THRESHOLD,
    PHISHING_MEDIUM_THRESHOLD, PHISHING_REVIEW_THRESHOLD, SUSPICIOUS_URL_REASON,
    SUSPICIOUS_URL_WEIGHT,
};

/// Reason reported when no rule matched at all
pub const SAFE_REASON: &str = "No clear phishing indicators detected";

/// Run the full rule table over a message body.
pub fn assess_email(text: &str) -> EmailAssessment {
    let mut score = 0;
    let mut reasons = Vec::new();

    for rule in EMAIL_RULES.iter() {
        if rule.matches(text) {
            score += rule.weight.value();
            reasons.push(rule.reason.to_string());
        }
    }

    if has_suspicious_url(text) {
        score += SUSPICIOUS_URL_WEIGHT;
        reasons.push(SUSPICIOUS_URL_REASON.to_string());
    }

    let (phishing, confidence) = if score >= PHISHING_HIGH_THRESHOLD {
        (true, Confidence::High)
    } else if score >= PHISHING_MEDIUM_THRESHOLD {
        (true, Confidence::Medium)
    } else if score >= PHISHING_REVIEW_THRESHOLD {
        (false, Confidence::LowSuspicion)
    } else {
        (false, Confidence::Safe)
    };

    if reasons.is_empty() {
        reasons.push(SAFE_REASON.to_string());
    }

    EmailAssessment {
        phishing,
        confidence,
        score,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_plus_suspicious_url_is_high_confidence() {
        // urgency_tactic (3) + embedded suspicious URL (2) = 5
        let assessment =
            assess_email("Urgent: please click this link http://security-verify.example.com");
        assert_eq!(assessment.score, 5);
        assert!(assessment.phishing);
        assert_eq!(assessment.confidence, Confidence::High);
        assert!(assessment
            .reasons
            .contains(&SUSPICIOUS_URL_REASON.to_string()));
    }

    #[test]
    fn test_scores_accumulate_across_rules() {
        // prize_scam (3) + poor_grammar (1) = 4 -> medium confidence
        let assessment = assess_email("you won a prize, claim your cash now!!");
        assert_eq!(assessment.score, 4);
        assert!(assessment.phishing);
        assert_eq!(assessment.confidence, Confidence::Medium);
        assert_eq!(assessment.reasons.len(), 2);
    }

    #[test]
    fn test_low_suspicion_is_flagged_not_phishing() {
        // suspicious_sender alone (2) -> review, not phishing
        let assessment = assess_email("newsletter from updates@weekly-digest.ml");
        assert_eq!(assessment.score, 2);
        assert!(!assessment.phishing);
        assert_eq!(assessment.confidence, Confidence::LowSuspicion);
    }

    #[test]
    fn test_benign_email_is_safe_with_default_reason() {
        let assessment = assess_email("hi, just checking in about the meeting tomorrow.");
        assert_eq!(assessment.score, 0);
        assert!(!assessment.phishing);
        assert_eq!(assessment.confidence, Confidence::Safe);
        assert_eq!(assessment.reasons, vec![SAFE_REASON.to_string()]);
    }

    #[test]
    fn test_empty_text_is_safe() {
        let assessment = assess_email("");
        assert!(!assessment.phishing);
        assert_eq!(assessment.confidence, Confidence::Safe);
        assert_eq!(assessment.reasons, vec![SAFE_REASON.to_string()]);
    }

    #[test]
    fn test_reason_join_format() {
        let assessment =
            assess_email("Urgent: please click this link http://security-verify.example.com");
        assert!(assessment.reason().contains(" | "));
    }
}
