//! Spam classification for contact-form submissions.
//!
//! # Purpose
//! A pure predicate over submitted field values, run before any downstream
//! write. Spam submissions still receive a success response upstream so
//! automated senders get no signal that they were caught.
//!
//! # Key invariants
//! - No I/O, no side effects; identical input yields identical verdicts.
//! - Rules are evaluated in order and the first match wins.
//! - Strings shorter than five characters never trip the mixed-case rule.
//!
//! The transition-ratio threshold is an empirical tuning against observed
//! spam samples, not a principled model. It is preserved exactly for
//! compatibility and is known to miss adversarial patterns such as unicode
//! lookalikes or sparsely placed transitions.
use crate::model::Submission;

/// Minimum string length before the mixed-case rule applies.
const MIN_MIXED_CASE_LEN: usize = 5;

/// Fraction of characters that must be case-transition bigrams to flag.
const TRANSITION_RATIO: f64 = 0.3;

/// Classification outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub is_spam: bool,
    pub reason: Option<String>,
}

impl Verdict {
    fn spam(reason: impl Into<String>) -> Self {
        Self {
            is_spam: true,
            reason: Some(reason.into()),
        }
    }

    fn clean() -> Self {
        Self {
            is_spam: false,
            reason: None,
        }
    }
}

/// Classify a submission. Rules in order, first match wins:
/// honeypot, first name, last name, free-text message.
pub fn classify(submission: &Submission) -> Verdict {
    if let Some(honeypot) = &submission.website {
        if !honeypot.trim().is_empty() {
            return Verdict::spam("honeypot field filled");
        }
    }

    if let Some(first_name) = &submission.first_name {
        if has_suspicious_mixed_case(first_name) {
            return Verdict::spam(format!(
                "suspicious mixed case in first name: {first_name}"
            ));
        }
    }

    if let Some(last_name) = &submission.last_name {
        if has_suspicious_mixed_case(last_name) {
            return Verdict::spam(format!(
                "suspicious mixed case in last name: {last_name}"
            ));
        }
    }

    if let Some(message) = &submission.message {
        if has_suspicious_mixed_case(message) {
            return Verdict::spam("suspicious mixed case in message");
        }
    }

    Verdict::clean()
}

/// Count case-transition bigrams (`aB` or `Ba`, ASCII only) and flag when
/// they exceed 30% of the character length. Strings under the length floor
/// never flag.
fn has_suspicious_mixed_case(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < MIN_MIXED_CASE_LEN {
        return false;
    }

    let transitions = chars
        .windows(2)
        .filter(|pair| {
            (pair[0].is_ascii_lowercase() && pair[1].is_ascii_uppercase())
                || (pair[0].is_ascii_uppercase() && pair[1].is_ascii_lowercase())
        })
        .count();

    transitions as f64 > chars.len() as f64 * TRANSITION_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(first: &str, last: &str, honeypot: &str) -> Submission {
        Submission {
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            website: Some(honeypot.to_string()),
            ..Submission::default()
        }
    }

    #[test]
    fn honeypot_always_wins() {
        let verdict = classify(&submission("Sarah", "Johnson", "http://spam.example"));
        assert!(verdict.is_spam);
        assert_eq!(verdict.reason.as_deref(), Some("honeypot field filled"));
    }

    #[test]
    fn whitespace_honeypot_is_clean() {
        assert!(!classify(&submission("Sarah", "Johnson", "   ")).is_spam);
    }

    #[test]
    fn gibberish_first_name_is_spam() {
        let verdict = classify(&submission("iMWJsSecHGorxgKbDsRbm", "Johnson", ""));
        assert!(verdict.is_spam);
        assert!(verdict.reason.unwrap().contains("first name"));
    }

    #[test]
    fn gibberish_last_name_is_spam() {
        let verdict = classify(&submission("Sarah", "IBImNNRqxTBytPGqxYt", ""));
        assert!(verdict.is_spam);
        assert!(verdict.reason.unwrap().contains("last name"));
    }

    #[test]
    fn gibberish_message_is_spam() {
        let mut sub = submission("Sarah", "Johnson", "");
        sub.message = Some("aBaBaBaBaBaBaBaB".to_string());
        assert!(classify(&sub).is_spam);
    }

    #[test]
    fn ordinary_names_are_clean() {
        assert!(!classify(&submission("Sarah", "Johnson", "")).is_spam);
        assert!(!classify(&submission("Mary-Anne", "O'Neill", "")).is_spam);
    }

    #[test]
    fn short_strings_never_flag() {
        // "aBaB" is 100% transitions but below the length floor.
        assert!(!has_suspicious_mixed_case("aBaB"));
        assert!(!has_suspicious_mixed_case("McFl"));
    }

    #[test]
    fn capitalized_names_below_threshold_are_clean() {
        // One transition over eight characters stays well under the line.
        assert!(!has_suspicious_mixed_case("Anderson"));
        assert!(!has_suspicious_mixed_case("Johnson"));
    }

    #[test]
    fn known_heuristic_weakness_flags_some_real_names() {
        // Documented false positive: short Mc/De names exceed the ratio.
        // Preserved for compatibility with the tuned threshold.
        assert!(has_suspicious_mixed_case("McAdams"));
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        // Ten characters, exactly three transitions: 0.3 is not > 0.3.
        assert!(!has_suspicious_mixed_case("abcDefghiJ"));
        // Four transitions over ten characters crosses the line.
        assert!(has_suspicious_mixed_case("abcDeFghij"));
    }

    #[test]
    fn classification_is_pure() {
        let sub = submission("iMWJsSecHGorxgKbDsRbm", "Johnson", "");
        assert_eq!(classify(&sub), classify(&sub));
    }

    #[test]
    fn empty_submission_is_clean() {
        assert!(!classify(&Submission::default()).is_spam);
    }
}
