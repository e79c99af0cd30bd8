//! Loader session facade
//!
//! [`FailbackLoader`] wires the resolver, classifier, attempt executor,
//! orchestrator, stats and event log into one session object. A session is
//! the lifetime of the counters: created at construction, reset only by an
//! explicit [`FailbackLoader::reset_session`].

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::{Semaphore, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::classify::BlockingClassifier;
use crate::config::Config;
use crate::errors::{LoaderError, LoaderResult};
use crate::events::{EventLog, LoaderEvent};
use crate::fetch::{AttemptExecutor, HttpAttemptExecutor};
use crate::models::{SegmentOutcome, SegmentRequest};
use crate::orchestrator::FailbackOrchestrator;
use crate::sources::{SourceResolver, TemplateSourceResolver};
use crate::stats::{SessionStats, StatsSnapshot};

/// One loader session: resolves segments with failover and accounts for
/// every terminal outcome.
pub struct FailbackLoader {
    session_id: Uuid,
    resolver: Arc<dyn SourceResolver>,
    classifier: Arc<BlockingClassifier>,
    orchestrator: FailbackOrchestrator,
    stats: Arc<SessionStats>,
    events: Arc<EventLog>,
    cancel: CancellationToken,
    attempt_timeout: Duration,
    max_concurrent: usize,
}

impl FailbackLoader {
    /// Build a loader with the HTTP attempt executor.
    pub fn from_config(config: &Config) -> LoaderResult<Self> {
        let classifier = Arc::new(BlockingClassifier::from_config(&config.blocking));
        let executor = Arc::new(HttpAttemptExecutor::new(
            Arc::clone(&classifier),
            &config.fetch,
        ));
        Self::with_executor(config, classifier, executor)
    }

    /// Build a loader around a custom attempt executor.
    ///
    /// The classifier is shared so that [`FailbackLoader::set_all_blocked`]
    /// reaches the executor's classification path; hosts and tests that
    /// substitute their own transport pass the same instance to both.
    pub fn with_executor(
        config: &Config,
        classifier: Arc<BlockingClassifier>,
        executor: Arc<dyn AttemptExecutor>,
    ) -> LoaderResult<Self> {
        config.validate()?;

        let resolver = Arc::new(TemplateSourceResolver::from_config(&config.sources)?);
        let stats = Arc::new(SessionStats::new());
        let events = Arc::new(EventLog::with_capacity(config.batch.feed_capacity));
        let orchestrator =
            FailbackOrchestrator::new(executor, Arc::clone(&stats), Arc::clone(&events));

        let session_id = Uuid::new_v4();
        info!("[FailbackLoader] session {} started", session_id);

        Ok(Self {
            session_id,
            resolver,
            classifier,
            orchestrator,
            stats,
            events,
            cancel: CancellationToken::new(),
            attempt_timeout: config.fetch.attempt_timeout,
            max_concurrent: config.batch.max_concurrent,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Derive the segment request (primary + failback candidates) for an id.
    pub fn request_for(&self, segment_id: &str) -> LoaderResult<SegmentRequest> {
        let mut candidates = self.resolver.resolve(segment_id)?;
        if candidates.is_empty() {
            return Err(LoaderError::internal(format!(
                "resolver produced no candidates for segment '{segment_id}'"
            )));
        }
        let primary_url = candidates.remove(0);
        Ok(SegmentRequest::new(
            segment_id,
            primary_url,
            candidates,
            self.attempt_timeout,
        ))
    }

    /// Resolve one explicit request to its terminal outcome.
    pub async fn load(&self, request: SegmentRequest) -> LoaderResult<SegmentOutcome> {
        self.orchestrator.resolve(&request, &self.cancel).await
    }

    /// Resolve one segment id through the configured source resolver.
    pub async fn load_segment(&self, segment_id: &str) -> LoaderResult<SegmentOutcome> {
        let request = self.request_for(segment_id)?;
        self.load(request).await
    }

    /// Resolve a batch of segments concurrently.
    ///
    /// Per-segment results come back in input order; concurrency is bounded
    /// by `batch.max_concurrent`.
    pub async fn load_batch(&self, requests: Vec<SegmentRequest>) -> BatchSummary {
        let start = Instant::now();
        info!(
            "[FailbackLoader] batch of {} segments starting (session {})",
            requests.len(),
            self.session_id
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let futures = requests.into_iter().map(|request| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let segment_id = request.segment_id.clone();
                let result = match semaphore.acquire().await {
                    Ok(_permit) => self.load(request).await,
                    Err(_) => Err(LoaderError::internal("batch semaphore closed")),
                };
                (segment_id, result)
            }
        });

        let summary = BatchSummary {
            results: join_all(futures).await,
            elapsed: start.elapsed(),
        };
        info!("{summary}");
        summary
    }

    /// Classify every subsequent failure as blocked (simulation mode).
    pub fn set_all_blocked(&self, enabled: bool) {
        self.classifier.set_all_blocked(enabled);
    }

    pub fn classifier(&self) -> Arc<BlockingClassifier> {
        Arc::clone(&self.classifier)
    }

    /// Point-in-time copy of the session counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Events recorded so far, in observation order.
    pub fn events(&self) -> Vec<LoaderEvent> {
        self.events.events()
    }

    /// Subscribe to events appended after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.events.subscribe()
    }

    /// Subscribe to the live feed as an async stream.
    pub fn event_stream(&self) -> BroadcastStream<LoaderEvent> {
        self.events.stream()
    }

    /// Token observed between attempts; cancel it to tear the session down.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Abandon all in-flight resolutions. Cancelled segments record no
    /// terminal outcome.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Start a fresh accounting session: counters and recorded events are
    /// cleared; live subscriptions stay attached.
    pub fn reset_session(&self) {
        info!("[FailbackLoader] session {} reset", self.session_id);
        self.stats.reset();
        self.events.clear();
    }
}

/// Result of one batch of segment loads.
#[derive(Debug)]
pub struct BatchSummary {
    /// Per-segment results, in input order
    pub results: Vec<(String, LoaderResult<SegmentOutcome>)>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Count of resolutions abandoned before a terminal outcome.
    pub fn aborted(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, result)| matches!(result, Err(LoaderError::Cancelled { .. })))
            .count()
    }

    /// Per-batch outcome tally (not the cumulative session counters).
    pub fn tally(&self) -> StatsSnapshot {
        let mut tally = StatsSnapshot::default();
        for (_, result) in &self.results {
            match result {
                Ok(SegmentOutcome::DirectSuccess) => tally.direct += 1,
                Ok(SegmentOutcome::FailbackSuccess(_)) => tally.failback += 1,
                Ok(SegmentOutcome::Blocked) => tally.blocked += 1,
                Ok(SegmentOutcome::Error) => tally.error += 1,
                Err(_) => {}
            }
        }
        tally
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tally = self.tally();
        write!(
            f,
            "[FailbackLoader] batch complete: {} segments in {:.2?} (direct {}, failback {}, blocked {}, error {})",
            self.total(),
            self.elapsed,
            tally.direct,
            tally.failback,
            tally.blocked,
            tally.error
        )
    }
}
