//! Per-segment failback state machine
//!
//! Drives one segment through its candidate sources strictly in priority
//! order: `Idle → TryingSource(i) → Succeeded | Exhausted`. Any failure
//! kind advances to the next candidate; the blocking/transient distinction
//! only decides the terminal `Blocked` vs `Error` classification once every
//! candidate has been tried. Each candidate is attempted at most once, and
//! exactly one terminal outcome is recorded per request.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{LoaderError, LoaderResult};
use crate::events::{EventLog, LoaderEvent};
use crate::fetch::AttemptExecutor;
use crate::models::{AttemptOutcome, AttemptRecord, SegmentOutcome, SegmentRequest};
use crate::stats::SessionStats;

/// Resolution states for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolveState {
    Idle,
    TryingSource(usize),
    Succeeded(SegmentOutcome),
    Exhausted,
}

/// Drives segment resolutions against an attempt executor, folding terminal
/// outcomes into the shared stats and event log.
pub struct FailbackOrchestrator {
    executor: Arc<dyn AttemptExecutor>,
    stats: Arc<SessionStats>,
    events: Arc<EventLog>,
}

impl FailbackOrchestrator {
    pub fn new(
        executor: Arc<dyn AttemptExecutor>,
        stats: Arc<SessionStats>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            executor,
            stats,
            events,
        }
    }

    /// Resolve one segment to its terminal outcome.
    ///
    /// Cancellation between attempts abandons the resolution: no terminal
    /// outcome is recorded, no counter moves, and the in-flight fetch is
    /// dropped promptly.
    pub async fn resolve(
        &self,
        request: &SegmentRequest,
        cancel: &CancellationToken,
    ) -> LoaderResult<SegmentOutcome> {
        let candidates: Vec<&str> = request.candidates().collect();
        let mut attempts: Vec<AttemptRecord> = Vec::with_capacity(candidates.len());
        let mut state = ResolveState::Idle;

        loop {
            state = match state {
                ResolveState::Idle => ResolveState::TryingSource(0),
                ResolveState::TryingSource(index) => {
                    self.try_source(request, &candidates, index, &mut attempts, cancel)
                        .await?
                }
                ResolveState::Succeeded(outcome) => {
                    self.stats.record(outcome);
                    return Ok(outcome);
                }
                ResolveState::Exhausted => {
                    let all_blocked = attempts.iter().all(|attempt| attempt.outcome.is_blocked());
                    let outcome = if all_blocked {
                        SegmentOutcome::Blocked
                    } else {
                        SegmentOutcome::Error
                    };
                    warn!(
                        "[FailbackLoader] {} exhausted all {} sources ({})",
                        request.segment_id,
                        candidates.len(),
                        outcome
                    );
                    self.events
                        .append(LoaderEvent::segment_exhausted(&request.segment_id, outcome));
                    self.stats.record(outcome);
                    return Ok(outcome);
                }
            };
        }
    }

    /// Attempt candidate `index` and decide the next state.
    async fn try_source(
        &self,
        request: &SegmentRequest,
        candidates: &[&str],
        index: usize,
        attempts: &mut Vec<AttemptRecord>,
        cancel: &CancellationToken,
    ) -> LoaderResult<ResolveState> {
        if cancel.is_cancelled() {
            return self.abort(request);
        }

        let url = candidates[index];
        if index == 0 {
            debug!("[FailbackLoader] {} fetching: {}", request.segment_id, url);
        } else {
            info!("[FailbackLoader] {} trying: {}", request.segment_id, url);
        }
        self.events
            .append(LoaderEvent::attempt_started(&request.segment_id, url, index));

        let record = tokio::select! {
            _ = cancel.cancelled() => return self.abort(request),
            record = self
                .executor
                .attempt(&request.segment_id, url, index, request.attempt_timeout) => record?,
        };

        let next = match &record.outcome {
            AttemptOutcome::Success => {
                let outcome = if index == 0 {
                    SegmentOutcome::DirectSuccess
                } else {
                    SegmentOutcome::FailbackSuccess(index)
                };
                if index == 0 {
                    info!("[FailbackLoader] {} SUCCESS (direct)", request.segment_id);
                } else {
                    info!(
                        "[FailbackLoader] {} SUCCESS via failback (source {})",
                        request.segment_id, index
                    );
                }
                self.events.append(LoaderEvent::segment_succeeded(
                    &request.segment_id,
                    outcome,
                    url,
                ));
                ResolveState::Succeeded(outcome)
            }
            AttemptOutcome::BlockedSignal { reason } => {
                warn!(
                    "[FailbackLoader] {} BLOCKED: {} ({})",
                    request.segment_id, url, reason
                );
                self.events.append(LoaderEvent::attempt_blocked(&record));
                advance(index, candidates.len())
            }
            AttemptOutcome::TransientError { reason } => {
                debug!(
                    "[FailbackLoader] {} attempt {} failed: {}",
                    request.segment_id, index, reason
                );
                self.events.append(LoaderEvent::attempt_failed(&record));
                advance(index, candidates.len())
            }
        };

        attempts.push(record);
        Ok(next)
    }

    fn abort(&self, request: &SegmentRequest) -> LoaderResult<ResolveState> {
        warn!("[FailbackLoader] {} aborted", request.segment_id);
        self.events
            .append(LoaderEvent::segment_aborted(&request.segment_id));
        Err(LoaderError::cancelled(&request.segment_id))
    }
}

/// Failover on any failure kind; exhaustion when no candidate remains.
fn advance(index: usize, candidate_count: usize) -> ResolveState {
    if index + 1 < candidate_count {
        ResolveState::TryingSource(index + 1)
    } else {
        ResolveState::Exhausted
    }
}
