//! Default values for configuration fields

use std::time::Duration;

pub fn default_attempt_timeout() -> Duration {
    Duration::from_secs(10)
}

pub fn default_min_segment_bytes() -> usize {
    1
}

pub fn default_blocking_statuses() -> Vec<String> {
    vec!["403".to_string(), "451".to_string()]
}

pub fn default_transport_signatures() -> Vec<String> {
    vec![
        "connection reset".to_string(),
        "connection refused".to_string(),
    ]
}

pub fn default_max_concurrent() -> usize {
    8
}

pub fn default_feed_capacity() -> usize {
    256
}
