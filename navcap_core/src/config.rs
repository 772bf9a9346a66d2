use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Number of records kept in the persisted log.
pub const DEFAULT_MAX_EVENTS: usize = 2000;

/// Captured field values are cut to this many characters.
pub const DEFAULT_MAX_FIELD_LEN: usize = 100;

pub const DEFAULT_EXPORT_FILE_NAME: &str = "navigation_events.json";

/// Selectors probed, in order, for the current section title after a view change.
pub const DEFAULT_HEADING_SELECTORS: [&str; 8] = [
    "main h1",
    "main h2",
    ".page-title",
    ".header",
    "h1",
    "h2",
    "[role='main'] h1",
    "[role='main'] h2",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Maximum number of records retained; oldest are evicted first
    pub max_events: usize,

    /// Truncation length for captured input values
    pub max_field_len: usize,

    /// Heading selectors used by the view-change heuristic
    pub heading_selectors: Vec<String>,

    /// Which view-change heuristic the mutation interceptor uses
    pub view_change: ViewChangeMode,

    /// File name offered for exports
    pub export_file_name: String,

    /// Backing file for the JSON file store
    pub store_path: Option<PathBuf>,

    /// Retry behaviour for failed store writes
    pub retry: RetryPolicy,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_events: DEFAULT_MAX_EVENTS,
            max_field_len: DEFAULT_MAX_FIELD_LEN,
            heading_selectors: DEFAULT_HEADING_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            view_change: ViewChangeMode::default(),
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            store_path: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl CaptureConfig {
    /// Parse a configuration from TOML; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: CaptureConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading capture config from {:?}", path);
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_events == 0 {
            return Err(ConfigError::Invalid {
                field: "max_events",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_field_len == 0 {
            return Err(ConfigError::Invalid {
                field: "max_field_len",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.export_file_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "export_file_name",
                reason: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewChangeMode {
    /// Any node insertion or removal counts as a view change
    #[default]
    Any,
    /// Only a change of the visible heading counts
    HeadingChange,
}

/// Fixed-backoff retry for store writes. Zero attempts means a failed
/// write is dropped.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = CaptureConfig::from_toml_str("").unwrap();
        assert_eq!(config.max_events, 2000);
        assert_eq!(config.max_field_len, 100);
        assert_eq!(config.export_file_name, "navigation_events.json");
        assert_eq!(config.heading_selectors.len(), 8);
        assert_eq!(config.heading_selectors[0], "main h1");
        assert_eq!(config.retry.attempts, 0);
        assert_eq!(config.view_change, ViewChangeMode::Any);
    }

    #[test]
    fn test_partial_override() {
        let config = CaptureConfig::from_toml_str(
            r#"
            max_events = 50
            store_path = "events.json"
            view_change = "heading-change"

            [retry]
            attempts = 3
            backoff_ms = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.max_events, 50);
        assert_eq!(config.max_field_len, 100);
        assert_eq!(config.store_path, Some(PathBuf::from("events.json")));
        assert_eq!(config.view_change, ViewChangeMode::HeadingChange);
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.retry.backoff(), Duration::from_millis(20));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = CaptureConfig::from_toml_str("max_events = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "max_events",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = CaptureConfig::from_toml_str("max_events = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("navcap.toml");
        std::fs::write(&path, "max_field_len = 10\n").unwrap();

        let config = CaptureConfig::from_file(&path).unwrap();
        assert_eq!(config.max_field_len, 10);
    }
}
