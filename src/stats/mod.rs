//! Session outcome accounting
//!
//! Four counters, one per terminal outcome kind. Exactly one counter is
//! incremented per segment reaching a terminal outcome (the orchestrator
//! guarantees a single `record` call), so at any observation point
//! `direct + failback + blocked + error` equals the number of terminal
//! segments. Counters never decrease outside an explicit session reset.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::models::SegmentOutcome;

/// Shared, thread-safe counters for one loader session.
#[derive(Debug, Default)]
pub struct SessionStats {
    direct: AtomicU64,
    failback: AtomicU64,
    blocked: AtomicU64,
    error: AtomicU64,
}

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub direct: u64,
    pub failback: u64,
    pub blocked: u64,
    pub error: u64,
}

impl StatsSnapshot {
    /// Total number of segments that reached a terminal outcome.
    pub fn terminal_total(&self) -> u64 {
        self.direct + self.failback + self.blocked + self.error
    }
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one terminal outcome into the counters.
    pub fn record(&self, outcome: SegmentOutcome) {
        match outcome {
            SegmentOutcome::DirectSuccess => {
                self.direct.fetch_add(1, Ordering::Relaxed);
            }
            SegmentOutcome::FailbackSuccess(_) => {
                self.failback.fetch_add(1, Ordering::Relaxed);
            }
            SegmentOutcome::Blocked => {
                self.blocked.fetch_add(1, Ordering::Relaxed);
            }
            SegmentOutcome::Error => {
                self.error.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            direct: self.direct.load(Ordering::Relaxed),
            failback: self.failback.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            error: self.error.load(Ordering::Relaxed),
        }
    }

    /// Zero all counters. Session restart only.
    pub fn reset(&self) {
        self.direct.store(0, Ordering::Relaxed);
        self.failback.store(0, Ordering::Relaxed);
        self.blocked.store(0, Ordering::Relaxed);
        self.error.store(0, Ordering::Relaxed);
    }
}
