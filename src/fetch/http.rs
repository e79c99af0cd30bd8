//! `reqwest`-backed attempt executor

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::classify::BlockingClassifier;
use crate::config::FetchConfig;
use crate::errors::{LoaderError, LoaderResult};
use crate::models::{AttemptOutcome, AttemptRecord};

use super::AttemptExecutor;

/// Raw result of one network round-trip, before classification.
enum RawFetch {
    Response { status: StatusCode, body_len: usize },
    Transport { error: String },
}

/// HTTP attempt executor bounded by a per-attempt timeout.
pub struct HttpAttemptExecutor {
    client: Client,
    classifier: Arc<BlockingClassifier>,
    min_segment_bytes: usize,
}

impl HttpAttemptExecutor {
    pub fn new(classifier: Arc<BlockingClassifier>, config: &FetchConfig) -> Self {
        let mut builder = Client::builder();
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        let client = builder.build().expect("Failed to create HTTP client");

        Self {
            client,
            classifier,
            min_segment_bytes: config.min_segment_bytes,
        }
    }

    async fn fetch_once(&self, url: &str) -> RawFetch {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return RawFetch::Transport {
                    error: e.to_string(),
                };
            }
        };

        let status = response.status();
        match response.bytes().await {
            Ok(bytes) => RawFetch::Response {
                status,
                body_len: bytes.len(),
            },
            Err(e) => RawFetch::Transport {
                error: format!("failed to read response body: {e}"),
            },
        }
    }
}

#[async_trait]
impl AttemptExecutor for HttpAttemptExecutor {
    async fn attempt(
        &self,
        segment_id: &str,
        url: &str,
        index: usize,
        timeout: Duration,
    ) -> LoaderResult<AttemptRecord> {
        // An unparseable candidate is a contract violation, not a network failure
        Url::parse(url).map_err(|e| {
            LoaderError::configuration(format!("invalid candidate URL '{url}': {e}"))
        })?;

        let started_at = chrono::Utc::now();
        let start = Instant::now();

        let (outcome, http_status) = match tokio::time::timeout(timeout, self.fetch_once(url)).await
        {
            Ok(RawFetch::Response { status, body_len }) => {
                let outcome = if status.is_success() {
                    if body_len >= self.min_segment_bytes {
                        AttemptOutcome::Success
                    } else {
                        // A truncated segment is not a blocking signal
                        AttemptOutcome::TransientError {
                            reason: format!("segment body too small: {body_len} bytes"),
                        }
                    }
                } else {
                    self.classifier.classify_status(status)
                };
                (outcome, Some(status.as_u16()))
            }
            Ok(RawFetch::Transport { error }) => (self.classifier.classify_transport(&error), None),
            Err(_) => {
                let reason = format!(
                    "attempt timed out after {}",
                    humantime::format_duration(timeout)
                );
                (self.classifier.classify_transport(&reason), None)
            }
        };

        debug!(
            "attempt {} for {} against {} finished in {:?}: {:?}",
            index,
            segment_id,
            url,
            start.elapsed(),
            outcome
        );

        Ok(AttemptRecord {
            segment_id: segment_id.to_string(),
            url: url.to_string(),
            index,
            outcome,
            duration: start.elapsed(),
            http_status,
            started_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockingConfig;

    #[tokio::test]
    async fn rejects_unparseable_candidate_url() {
        let classifier = Arc::new(BlockingClassifier::from_config(&BlockingConfig::default()));
        let executor = HttpAttemptExecutor::new(classifier, &FetchConfig::default());

        let err = executor
            .attempt("seg-001.ts", "not a url", 0, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, LoaderError::Configuration { .. }));
    }
}
