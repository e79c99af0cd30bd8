//! Candidate source resolution
//!
//! Given a segment identifier, a resolver produces the ordered list of
//! candidate URLs the orchestrator will try: the primary (direct) URL
//! first, then failback URLs in priority order.

pub mod traits;

mod template;

pub use template::TemplateSourceResolver;
pub use traits::SourceResolver;
