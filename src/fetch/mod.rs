//! Single fetch attempts
//!
//! One call performs exactly one bounded fetch against one candidate URL
//! and classifies the result. Expected network failures are represented in
//! the returned record's outcome, never as `Err`; only contract violations
//! (an unparseable candidate URL) surface as errors.

pub mod http;

pub use http::HttpAttemptExecutor;

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::LoaderResult;
use crate::models::AttemptRecord;

/// Performs one bounded fetch attempt against one candidate URL.
#[async_trait]
pub trait AttemptExecutor: Send + Sync {
    async fn attempt(
        &self,
        segment_id: &str,
        url: &str,
        index: usize,
        timeout: Duration,
    ) -> LoaderResult<AttemptRecord>;
}
