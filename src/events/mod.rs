//! Structured event log with a live broadcast feed
//!
//! Every state transition the orchestrator observes is appended here as a
//! structured event: the in-memory log is the restartable historical
//! sequence, and a bounded `tokio::sync::broadcast` channel fans the same
//! events out to live subscribers (UI, tests, metrics pipelines). Ordering
//! is the order transitions were observed; per-segment causal order is
//! preserved, global order may interleave across concurrently resolving
//! segments.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::models::{AttemptRecord, SegmentOutcome};

/// Default capacity of the live event feed channel
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// One observed loader transition.
///
/// `Display` renders the stable, greppable log line external observers
/// pattern-match on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LoaderEvent {
    AttemptStarted {
        segment_id: String,
        url: String,
        index: usize,
        timestamp: DateTime<Utc>,
    },
    AttemptBlocked {
        segment_id: String,
        url: String,
        index: usize,
        reason: String,
        http_status: Option<u16>,
        timestamp: DateTime<Utc>,
    },
    AttemptFailed {
        segment_id: String,
        url: String,
        index: usize,
        reason: String,
        http_status: Option<u16>,
        timestamp: DateTime<Utc>,
    },
    SegmentSucceeded {
        segment_id: String,
        outcome: SegmentOutcome,
        url: String,
        timestamp: DateTime<Utc>,
    },
    SegmentExhausted {
        segment_id: String,
        outcome: SegmentOutcome,
        timestamp: DateTime<Utc>,
    },
    SegmentAborted {
        segment_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl LoaderEvent {
    pub fn attempt_started(segment_id: &str, url: &str, index: usize) -> Self {
        Self::AttemptStarted {
            segment_id: segment_id.to_string(),
            url: url.to_string(),
            index,
            timestamp: Utc::now(),
        }
    }

    /// Build the blocked-attempt event from a classified record.
    pub fn attempt_blocked(record: &AttemptRecord) -> Self {
        Self::AttemptBlocked {
            segment_id: record.segment_id.clone(),
            url: record.url.clone(),
            index: record.index,
            reason: record.outcome.reason().unwrap_or_default().to_string(),
            http_status: record.http_status,
            timestamp: Utc::now(),
        }
    }

    pub fn attempt_failed(record: &AttemptRecord) -> Self {
        Self::AttemptFailed {
            segment_id: record.segment_id.clone(),
            url: record.url.clone(),
            index: record.index,
            reason: record.outcome.reason().unwrap_or_default().to_string(),
            http_status: record.http_status,
            timestamp: Utc::now(),
        }
    }

    pub fn segment_succeeded(segment_id: &str, outcome: SegmentOutcome, url: &str) -> Self {
        Self::SegmentSucceeded {
            segment_id: segment_id.to_string(),
            outcome,
            url: url.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn segment_exhausted(segment_id: &str, outcome: SegmentOutcome) -> Self {
        Self::SegmentExhausted {
            segment_id: segment_id.to_string(),
            outcome,
            timestamp: Utc::now(),
        }
    }

    pub fn segment_aborted(segment_id: &str) -> Self {
        Self::SegmentAborted {
            segment_id: segment_id.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn segment_id(&self) -> &str {
        match self {
            Self::AttemptStarted { segment_id, .. }
            | Self::AttemptBlocked { segment_id, .. }
            | Self::AttemptFailed { segment_id, .. }
            | Self::SegmentSucceeded { segment_id, .. }
            | Self::SegmentExhausted { segment_id, .. }
            | Self::SegmentAborted { segment_id, .. } => segment_id,
        }
    }
}

impl fmt::Display for LoaderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttemptStarted {
                segment_id,
                url,
                index: 0,
                ..
            } => {
                write!(f, "[FailbackLoader] {segment_id} fetching: {url}")
            }
            Self::AttemptStarted {
                segment_id, url, ..
            } => {
                write!(f, "[FailbackLoader] {segment_id} trying: {url}")
            }
            Self::AttemptBlocked {
                segment_id,
                url,
                reason,
                ..
            } => {
                write!(f, "[FailbackLoader] {segment_id} BLOCKED: {url} ({reason})")
            }
            Self::AttemptFailed {
                segment_id,
                url,
                reason,
                ..
            } => {
                write!(f, "[FailbackLoader] {segment_id} failed: {url} ({reason})")
            }
            Self::SegmentSucceeded {
                segment_id,
                outcome: SegmentOutcome::DirectSuccess,
                ..
            } => {
                write!(f, "[FailbackLoader] {segment_id} SUCCESS (direct)")
            }
            Self::SegmentSucceeded {
                segment_id,
                outcome: SegmentOutcome::FailbackSuccess(index),
                ..
            } => {
                write!(
                    f,
                    "[FailbackLoader] {segment_id} SUCCESS via failback (source {index})"
                )
            }
            Self::SegmentSucceeded {
                segment_id,
                outcome,
                ..
            } => {
                write!(f, "[FailbackLoader] {segment_id} SUCCESS ({outcome})")
            }
            Self::SegmentExhausted {
                segment_id,
                outcome: SegmentOutcome::Blocked,
                ..
            } => {
                write!(f, "[FailbackLoader] {segment_id} BLOCKED on all sources")
            }
            Self::SegmentExhausted { segment_id, .. } => {
                write!(f, "[FailbackLoader] {segment_id} failed on all sources")
            }
            Self::SegmentAborted { segment_id, .. } => {
                write!(f, "[FailbackLoader] {segment_id} aborted")
            }
        }
    }
}

/// Append-only log of loader events with a live broadcast feed.
#[derive(Debug)]
pub struct EventLog {
    entries: Mutex<Vec<LoaderEvent>>,
    feed: broadcast::Sender<LoaderEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FEED_CAPACITY)
    }

    /// Create an event log whose live feed buffers up to `feed_capacity`
    /// events per subscriber.
    pub fn with_capacity(feed_capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(feed_capacity);
        Self {
            entries: Mutex::new(Vec::new()),
            feed,
        }
    }

    /// Append an event; live subscribers receive it immediately.
    pub fn append(&self, event: LoaderEvent) {
        // Send errors only mean there are no live subscribers
        let _ = self.feed.send(event.clone());
        self.entries
            .lock()
            .expect("event log lock poisoned")
            .push(event);
    }

    /// Snapshot of all events recorded so far, in append order.
    pub fn events(&self) -> Vec<LoaderEvent> {
        self.entries
            .lock()
            .expect("event log lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("event log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to events appended after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.feed.subscribe()
    }

    /// Subscribe as an async stream.
    pub fn stream(&self) -> BroadcastStream<LoaderEvent> {
        BroadcastStream::new(self.feed.subscribe())
    }

    /// Drop recorded entries. Session restart only; live subscriptions stay
    /// attached.
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("event log lock poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lines_are_greppable() {
        let started = LoaderEvent::attempt_started("seg-001.ts", "http://mirror.test/seg", 1);
        assert_eq!(
            started.to_string(),
            "[FailbackLoader] seg-001.ts trying: http://mirror.test/seg"
        );

        let direct =
            LoaderEvent::segment_succeeded("seg-001.ts", SegmentOutcome::DirectSuccess, "u");
        assert!(direct.to_string().contains("SUCCESS (direct)"));

        let failback =
            LoaderEvent::segment_succeeded("seg-001.ts", SegmentOutcome::FailbackSuccess(1), "u");
        assert!(failback.to_string().contains("SUCCESS via failback"));

        let blocked = LoaderEvent::segment_exhausted("seg-001.ts", SegmentOutcome::Blocked);
        assert!(blocked.to_string().contains("BLOCKED"));
    }

    #[test]
    fn append_preserves_order_and_feeds_subscribers() {
        let log = EventLog::new();
        let mut rx = log.subscribe();

        log.append(LoaderEvent::attempt_started("a", "http://p.test/a", 0));
        log.append(LoaderEvent::segment_succeeded(
            "a",
            SegmentOutcome::DirectSuccess,
            "http://p.test/a",
        ));

        let events = log.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LoaderEvent::AttemptStarted { .. }));
        assert!(matches!(events[1], LoaderEvent::SegmentSucceeded { .. }));

        assert!(matches!(
            rx.try_recv().unwrap(),
            LoaderEvent::AttemptStarted { .. }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            LoaderEvent::SegmentSucceeded { .. }
        ));
    }
}
