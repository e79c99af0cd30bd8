//! Source resolver trait definition

use crate::errors::LoaderResult;

/// Derives the ordered candidate URLs for a segment.
///
/// The first element is the primary (direct) URL; subsequent elements are
/// failback URLs in priority order. Implementations must be deterministic
/// for a given configuration and side-effect-free. Fails with a
/// configuration error when no primary URL can be derived.
pub trait SourceResolver: Send + Sync {
    fn resolve(&self, segment_id: &str) -> LoaderResult<Vec<String>>;
}
