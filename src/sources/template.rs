//! Base-URL template resolver

use url::Url;

use crate::config::SourcesConfig;
use crate::errors::{LoaderError, LoaderResult};

use super::SourceResolver;

/// Resolves candidates by joining the segment id onto configured base URLs.
///
/// The primary base produces the direct URL; each failback base produces one
/// mirror URL, in configuration order.
#[derive(Debug, Clone)]
pub struct TemplateSourceResolver {
    primary_base: Url,
    failback_bases: Vec<Url>,
}

impl TemplateSourceResolver {
    pub fn from_config(config: &SourcesConfig) -> LoaderResult<Self> {
        if config.primary_base.trim().is_empty() {
            return Err(LoaderError::configuration(
                "no primary source base configured",
            ));
        }

        let primary_base = parse_base(&config.primary_base)?;
        let failback_bases = config
            .failback_bases
            .iter()
            .map(|base| parse_base(base))
            .collect::<LoaderResult<Vec<_>>>()?;

        Ok(Self {
            primary_base,
            failback_bases,
        })
    }
}

impl SourceResolver for TemplateSourceResolver {
    fn resolve(&self, segment_id: &str) -> LoaderResult<Vec<String>> {
        let mut candidates = Vec::with_capacity(1 + self.failback_bases.len());
        candidates.push(join_segment(&self.primary_base, segment_id)?);
        for base in &self.failback_bases {
            candidates.push(join_segment(base, segment_id)?);
        }
        Ok(candidates)
    }
}

/// Parse a base URL, normalizing to a trailing slash so joins keep the path.
fn parse_base(raw: &str) -> LoaderResult<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized)
        .map_err(|e| LoaderError::configuration(format!("invalid source base '{raw}': {e}")))
}

fn join_segment(base: &Url, segment_id: &str) -> LoaderResult<String> {
    base.join(segment_id)
        .map(|url| url.to_string())
        .map_err(|e| {
            LoaderError::configuration(format!("cannot derive URL for segment '{segment_id}': {e}"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(primary: &str, failbacks: &[&str]) -> SourcesConfig {
        SourcesConfig {
            primary_base: primary.to_string(),
            failback_bases: failbacks.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn resolves_primary_first_then_failbacks_in_order() {
        let resolver = TemplateSourceResolver::from_config(&config(
            "http://cdn.example.com/segments/",
            &["http://mirror-a.example.com/", "http://mirror-b.example.com/"],
        ))
        .unwrap();

        let candidates = resolver.resolve("seg-007.ts").unwrap();
        assert_eq!(
            candidates,
            vec![
                "http://cdn.example.com/segments/seg-007.ts",
                "http://mirror-a.example.com/seg-007.ts",
                "http://mirror-b.example.com/seg-007.ts",
            ]
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let resolver = TemplateSourceResolver::from_config(&config(
            "http://cdn.example.com/hls",
            &["http://mirror.example.com/hls"],
        ))
        .unwrap();

        assert_eq!(
            resolver.resolve("seg-001.ts").unwrap(),
            resolver.resolve("seg-001.ts").unwrap()
        );
    }

    #[test]
    fn missing_trailing_slash_keeps_base_path() {
        let resolver =
            TemplateSourceResolver::from_config(&config("http://cdn.example.com/hls", &[])).unwrap();

        assert_eq!(
            resolver.resolve("seg-001.ts").unwrap(),
            vec!["http://cdn.example.com/hls/seg-001.ts"]
        );
    }

    #[test]
    fn empty_primary_base_is_a_configuration_error() {
        let err = TemplateSourceResolver::from_config(&config("  ", &[])).unwrap_err();
        assert!(matches!(err, LoaderError::Configuration { .. }));
    }

    #[test]
    fn malformed_failback_base_is_a_configuration_error() {
        let err = TemplateSourceResolver::from_config(&config(
            "http://cdn.example.com/",
            &["not a url"],
        ))
        .unwrap_err();
        assert!(matches!(err, LoaderError::Configuration { .. }));
    }
}
