//! Blocking classification policy
//!
//! Centralizes the distinction between "this source is actively blocked,
//! failing over is the expected remedy" and "this was an ordinary network
//! hiccup". The policy is table-driven: a configured set of HTTP status
//! patterns (exact like "403" or wildcard like "4xx") and transport-error
//! signatures map to a blocking signal; everything else is transient.
//!
//! The classifier is intentionally **pure policy** (no fetching); the
//! attempt executor feeds it raw statuses and transport errors. An
//! `all_blocked` override forces every failure to classify as blocking so
//! a simulation harness can exercise full-failover behavior.

use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::StatusCode;
use tracing::debug;

use crate::config::BlockingConfig;
use crate::models::AttemptOutcome;

/// Table-driven classifier for failed fetch attempts.
#[derive(Debug)]
pub struct BlockingClassifier {
    status_patterns: Vec<String>,
    transport_signatures: Vec<String>,
    all_blocked: AtomicBool,
}

impl BlockingClassifier {
    pub fn from_config(config: &BlockingConfig) -> Self {
        Self {
            status_patterns: config.statuses.clone(),
            transport_signatures: config
                .transport_signatures
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            all_blocked: AtomicBool::new(config.all_blocked),
        }
    }

    /// Force every subsequent failure to classify as a blocking signal.
    ///
    /// Takes effect for all attempts started after the call; toggle it
    /// before a batch begins.
    pub fn set_all_blocked(&self, enabled: bool) {
        debug!("all-blocked simulation mode set to {}", enabled);
        self.all_blocked.store(enabled, Ordering::SeqCst);
    }

    pub fn all_blocked(&self) -> bool {
        self.all_blocked.load(Ordering::SeqCst)
    }

    /// Classify a non-success HTTP status.
    pub fn classify_status(&self, status: StatusCode) -> AttemptOutcome {
        let reason = format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );
        if self.all_blocked() || status_matches(status.as_u16(), &self.status_patterns) {
            AttemptOutcome::BlockedSignal { reason }
        } else {
            AttemptOutcome::TransientError { reason }
        }
    }

    /// Classify a transport-level failure (no response received).
    pub fn classify_transport(&self, error: &str) -> AttemptOutcome {
        let lowered = error.to_lowercase();
        let matched = self
            .transport_signatures
            .iter()
            .any(|signature| lowered.contains(signature));
        if self.all_blocked() || matched {
            AttemptOutcome::BlockedSignal {
                reason: error.to_string(),
            }
        } else {
            AttemptOutcome::TransientError {
                reason: error.to_string(),
            }
        }
    }
}

/// Check if a status code matches any of the configured blocking patterns
fn status_matches(status_code: u16, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|pattern| matches_pattern(status_code, pattern))
}

/// Check if a status code matches a specific pattern
fn matches_pattern(status_code: u16, pattern: &str) -> bool {
    if pattern.ends_with("xx") {
        // Handle wildcard patterns like "4xx", "5xx"
        if pattern.len() == 3 {
            let prefix = &pattern[0..1];
            if let Ok(prefix_digit) = prefix.parse::<u16>() {
                let status_prefix = status_code / 100;
                return status_prefix == prefix_digit;
            }
        }
    } else {
        // Handle exact matches like "403", "451"
        if let Ok(exact_code) = pattern.parse::<u16>() {
            return status_code == exact_code;
        }
    }

    false
}

/// Whether a configured pattern is well-formed: an exact HTTP status code or
/// a single-digit wildcard class like "4xx".
pub fn is_valid_status_pattern(pattern: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix("xx") {
        return prefix.len() == 1 && matches!(prefix.parse::<u16>(), Ok(1..=5));
    }
    matches!(pattern.parse::<u16>(), Ok(100..=599))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockingConfig;

    fn classifier() -> BlockingClassifier {
        BlockingClassifier::from_config(&BlockingConfig::default())
    }

    #[test]
    fn default_table_blocks_403_and_451() {
        let classifier = classifier();

        assert!(
            classifier
                .classify_status(StatusCode::FORBIDDEN)
                .is_blocked()
        );
        assert!(
            classifier
                .classify_status(StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS)
                .is_blocked()
        );
        assert!(
            !classifier
                .classify_status(StatusCode::INTERNAL_SERVER_ERROR)
                .is_blocked()
        );
        assert!(
            !classifier
                .classify_status(StatusCode::NOT_FOUND)
                .is_blocked()
        );
    }

    #[test]
    fn wildcard_patterns_block_whole_class() {
        let config = BlockingConfig {
            statuses: vec!["4xx".to_string()],
            ..BlockingConfig::default()
        };
        let classifier = BlockingClassifier::from_config(&config);

        assert!(
            classifier
                .classify_status(StatusCode::NOT_FOUND)
                .is_blocked()
        );
        assert!(
            classifier
                .classify_status(StatusCode::FORBIDDEN)
                .is_blocked()
        );
        assert!(
            !classifier
                .classify_status(StatusCode::BAD_GATEWAY)
                .is_blocked()
        );
    }

    #[test]
    fn transport_signatures_match_case_insensitively() {
        let classifier = classifier();

        assert!(
            classifier
                .classify_transport("Connection Reset by peer")
                .is_blocked()
        );
        assert!(
            !classifier
                .classify_transport("dns error: no record found")
                .is_blocked()
        );
    }

    #[test]
    fn all_blocked_overrides_every_failure() {
        let classifier = classifier();
        classifier.set_all_blocked(true);

        assert!(
            classifier
                .classify_status(StatusCode::INTERNAL_SERVER_ERROR)
                .is_blocked()
        );
        assert!(classifier.classify_transport("timed out").is_blocked());

        classifier.set_all_blocked(false);
        assert!(!classifier.classify_transport("timed out").is_blocked());
    }

    #[test]
    fn pattern_validation() {
        assert!(is_valid_status_pattern("403"));
        assert!(is_valid_status_pattern("4xx"));
        assert!(is_valid_status_pattern("5xx"));
        assert!(!is_valid_status_pattern("40x"));
        assert!(!is_valid_status_pattern("xx"));
        assert!(!is_valid_status_pattern("6xx"));
        assert!(!is_valid_status_pattern("999"));
        assert!(!is_valid_status_pattern("forbidden"));
    }
}
