//! Error type definitions for the failback loader

use thiserror::Error;

/// Convenience type alias for Results using LoaderError
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Top-level loader error type
///
/// Uses `thiserror` to provide automatic error trait implementations.
/// Per-attempt network failures are NOT errors; see the module docs.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Configuration errors (no primary source, malformed URL or pattern)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Resolution abandoned before reaching a terminal outcome
    #[error("Resolution cancelled for segment {segment_id}")]
    Cancelled { segment_id: String },

    /// Programming-contract violations
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Convenience methods for creating common error types
impl LoaderError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a cancellation error for a segment
    pub fn cancelled<S: Into<String>>(segment_id: S) -> Self {
        Self::Cancelled {
            segment_id: segment_id.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error represents an abandoned resolution
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
