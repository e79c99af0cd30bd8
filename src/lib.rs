//! Failback segment loader
//!
//! A resilient fetch pipeline for streaming-media segments: each segment is
//! fetched from its primary source first, failures are classified as active
//! blocking versus ordinary network trouble, and the loader transparently
//! fails over through the configured mirror sources while accounting for
//! every segment's terminal outcome.

pub mod classify;
pub mod config;
pub mod errors;
pub mod events;
pub mod fetch;
pub mod loader;
pub mod models;
pub mod orchestrator;
pub mod sources;
pub mod stats;

pub use classify::BlockingClassifier;
pub use errors::{LoaderError, LoaderResult};
pub use events::{EventLog, LoaderEvent};
pub use fetch::{AttemptExecutor, HttpAttemptExecutor};
pub use loader::{BatchSummary, FailbackLoader};
pub use models::{AttemptOutcome, AttemptRecord, SegmentOutcome, SegmentRequest};
pub use sources::{SourceResolver, TemplateSourceResolver};
pub use stats::{SessionStats, StatsSnapshot};
