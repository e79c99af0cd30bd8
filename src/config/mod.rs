use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

use crate::classify::is_valid_status_pattern;
use crate::errors::{LoaderError, LoaderResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub blocking: BlockingConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Source bases segment URLs are derived from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Base URL segments are fetched from first. This is the ONLY mandatory field
    #[serde(default)]
    pub primary_base: String,
    /// Mirror base URLs tried in priority order after the primary fails
    #[serde(default)]
    pub failback_bases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Wall-clock bound for one attempt against one candidate
    #[serde(default = "default_attempt_timeout", with = "duration_serde::duration")]
    pub attempt_timeout: Duration,
    /// Optional connect timeout for the underlying HTTP client
    #[serde(
        default,
        with = "duration_serde::option_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub connect_timeout: Option<Duration>,
    /// Smallest body accepted as a real media segment
    #[serde(default = "default_min_segment_bytes")]
    pub min_segment_bytes: usize,
}

/// Blocking-indicator policy tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingConfig {
    /// HTTP status patterns treated as blocking signals; exact ("403") or wildcard ("4xx")
    #[serde(default = "default_blocking_statuses")]
    pub statuses: Vec<String>,
    /// Transport-error substrings treated as blocking signals
    #[serde(default = "default_transport_signatures")]
    pub transport_signatures: Vec<String>,
    /// Start sessions with every failure classified as blocked (simulation mode)
    #[serde(default)]
    pub all_blocked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of segments resolving concurrently in one batch
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Capacity of the live event feed channel
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: default_attempt_timeout(),
            connect_timeout: None,
            min_segment_bytes: default_min_segment_bytes(),
        }
    }
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            statuses: default_blocking_statuses(),
            transport_signatures: default_transport_signatures(),
            all_blocked: false,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            feed_capacity: default_feed_capacity(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }

    /// Validate the parts of the configuration a loader cannot start without.
    ///
    /// The primary base is mandatory; mirror bases and status patterns must
    /// be well-formed when present.
    pub fn validate(&self) -> LoaderResult<()> {
        if self.sources.primary_base.trim().is_empty() {
            return Err(LoaderError::configuration(
                "no primary source base configured",
            ));
        }

        for pattern in &self.blocking.statuses {
            if !is_valid_status_pattern(pattern) {
                return Err(LoaderError::configuration(format!(
                    "invalid blocking status pattern '{pattern}' (expected e.g. '403' or '4xx')"
                )));
            }
        }

        if self.batch.max_concurrent == 0 {
            return Err(LoaderError::configuration(
                "batch.max_concurrent must be at least 1",
            ));
        }

        if self.batch.feed_capacity == 0 {
            return Err(LoaderError::configuration(
                "batch.feed_capacity must be at least 1",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fails_validation_without_primary_base() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_minimal_config() {
        let config: Config = toml::from_str(
            r#"
            [sources]
            primary_base = "http://cdn.example.com/segments/"
            failback_bases = ["http://mirror.example.com/segments/"]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.sources.primary_base,
            "http://cdn.example.com/segments/"
        );
        assert_eq!(config.fetch.attempt_timeout, Duration::from_secs(10));
        assert_eq!(config.blocking.statuses, vec!["403", "451"]);
        assert!(!config.blocking.all_blocked);
        config.validate().unwrap();
    }

    #[test]
    fn parses_human_readable_timeouts() {
        let config: Config = toml::from_str(
            r#"
            [sources]
            primary_base = "http://cdn.example.com/"

            [fetch]
            attempt_timeout = "1500ms"
            connect_timeout = "2s"
            "#,
        )
        .unwrap();

        assert_eq!(config.fetch.attempt_timeout, Duration::from_millis(1500));
        assert_eq!(config.fetch.connect_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn rejects_malformed_status_pattern() {
        let mut config = Config::default();
        config.sources.primary_base = "http://cdn.example.com/".to_string();
        config.blocking.statuses = vec!["40x".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn writes_default_file_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let config = Config::load_from_file(path_str).unwrap();
        assert!(path.exists());
        assert!(config.sources.primary_base.is_empty());

        // Second load reads the file written on the first
        let reloaded = Config::load_from_file(path_str).unwrap();
        assert_eq!(reloaded.batch.max_concurrent, config.batch.max_concurrent);
    }
}
