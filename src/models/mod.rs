//! Domain model for segment resolution
//!
//! One [`SegmentRequest`] produces an ordered sequence of
//! [`AttemptRecord`]s (one per candidate source tried) and exactly one
//! terminal [`SegmentOutcome`]. Attempt outcomes are a closed sum type so
//! the orchestrator's handling is exhaustiveness-checked by the compiler,
//! never inferred from status strings.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::duration_serde;

/// One fetchable unit: a media segment and its candidate sources.
///
/// Immutable once issued; a re-request of the same segment id starts a
/// fresh resolution with its own state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRequest {
    /// Stable identifier for the segment (e.g. `seg-042.ts`)
    pub segment_id: String,
    /// First-priority (direct) URL
    pub primary_url: String,
    /// Failback URLs in priority order; may be empty when no mirror is configured
    #[serde(default)]
    pub failback_urls: Vec<String>,
    /// Wall-clock bound applied independently to each attempt
    #[serde(with = "duration_serde::duration")]
    pub attempt_timeout: Duration,
}

impl SegmentRequest {
    pub fn new<S: Into<String>, U: Into<String>>(
        segment_id: S,
        primary_url: U,
        failback_urls: Vec<String>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            segment_id: segment_id.into(),
            primary_url: primary_url.into(),
            failback_urls,
            attempt_timeout,
        }
    }

    /// All candidate URLs, primary first, failbacks in priority order.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_url.as_str())
            .chain(self.failback_urls.iter().map(String::as_str))
    }

    /// Number of configured candidate sources (primary included).
    pub fn candidate_count(&self) -> usize {
        1 + self.failback_urls.len()
    }
}

/// Classification of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Success status with a body satisfying the minimum segment shape
    Success,
    /// The response or transport indicates active blocking of this source
    BlockedSignal { reason: String },
    /// Any other network failure (timeout, DNS, unconfigured 5xx)
    TransientError { reason: String },
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::BlockedSignal { .. })
    }

    /// Failure reason text, if this outcome is a failure.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::BlockedSignal { reason } | Self::TransientError { reason } => Some(reason),
        }
    }
}

/// One fetch attempt against one candidate URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub segment_id: String,
    pub url: String,
    /// Candidate index; 0 is the primary source
    pub index: usize,
    pub outcome: AttemptOutcome,
    #[serde(with = "duration_serde::duration")]
    pub duration: Duration,
    /// HTTP status, when a response was received at all
    pub http_status: Option<u16>,
    pub started_at: DateTime<Utc>,
}

/// Terminal result of one segment resolution.
///
/// Exactly one is produced per [`SegmentRequest`]; the session counters sum
/// to the number of segments that reached one of these. The display labels
/// match the externally visible counter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(tag = "kind", content = "source_index", rename_all = "snake_case")]
pub enum SegmentOutcome {
    /// The primary source answered
    #[strum(serialize = "direct")]
    DirectSuccess,
    /// A failback source answered; carries its candidate index
    #[strum(serialize = "failback")]
    FailbackSuccess(usize),
    /// All sources exhausted, every attempt carried a blocking signal
    #[strum(serialize = "blocked")]
    Blocked,
    /// All sources exhausted with at least one non-blocking failure
    #[strum(serialize = "error")]
    Error,
}

impl SegmentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::DirectSuccess | Self::FailbackSuccess(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_yield_primary_first() {
        let request = SegmentRequest::new(
            "seg-001.ts",
            "http://primary.test/seg-001.ts",
            vec![
                "http://mirror-a.test/seg-001.ts".to_string(),
                "http://mirror-b.test/seg-001.ts".to_string(),
            ],
            Duration::from_secs(5),
        );

        let candidates: Vec<&str> = request.candidates().collect();
        assert_eq!(
            candidates,
            vec![
                "http://primary.test/seg-001.ts",
                "http://mirror-a.test/seg-001.ts",
                "http://mirror-b.test/seg-001.ts",
            ]
        );
        assert_eq!(request.candidate_count(), 3);
    }

    #[test]
    fn outcome_labels_match_counter_names() {
        assert_eq!(SegmentOutcome::DirectSuccess.to_string(), "direct");
        assert_eq!(SegmentOutcome::FailbackSuccess(1).to_string(), "failback");
        assert_eq!(SegmentOutcome::Blocked.to_string(), "blocked");
        assert_eq!(SegmentOutcome::Error.to_string(), "error");
    }

    #[test]
    fn blocked_attempts_are_not_successes() {
        let blocked = AttemptOutcome::BlockedSignal {
            reason: "HTTP 403 Forbidden".to_string(),
        };
        assert!(blocked.is_blocked());
        assert!(!blocked.is_success());
        assert_eq!(blocked.reason(), Some("HTTP 403 Forbidden"));
        assert_eq!(AttemptOutcome::Success.reason(), None);
    }
}
