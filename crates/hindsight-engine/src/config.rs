//! Engine configuration.

use std::path::Path;
use std::time::Duration;

use hindsight_traits::MarketDataLocation;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Execution settings shared by every context built from it.
///
/// Loaded from TOML; every field has a default, so an empty file is valid:
///
/// ```toml
/// default_location = "LDN"
/// request_timeout_secs = 120
/// batch_timeout_secs = 7200
/// max_concurrent_requests = 16
/// default_calendars = ["NYC"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Market data location used when a context does not name one
    #[serde(default)]
    pub default_location: MarketDataLocation,

    /// Budget for one remote request in interactive mode
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Budget for one remote request in batch mode
    #[serde(default = "default_batch_timeout_secs")]
    pub batch_timeout_secs: u64,

    /// Upper bound on in-flight remote requests per context
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Holiday calendars applied when a context names none
    #[serde(default)]
    pub default_calendars: Vec<String>,
}

fn default_request_timeout_secs() -> u64 {
    180
}

fn default_batch_timeout_secs() -> u64 {
    3600
}

fn default_max_concurrent_requests() -> usize {
    32
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_location: MarketDataLocation::default(),
            request_timeout_secs: default_request_timeout_secs(),
            batch_timeout_secs: default_batch_timeout_secs(),
            max_concurrent_requests: default_max_concurrent_requests(),
            default_calendars: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::ConfigError(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| EngineError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the limits are usable.
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_concurrent_requests == 0 {
            return Err(EngineError::ConfigError(
                "max_concurrent_requests must be at least 1".into(),
            ));
        }
        if self.request_timeout_secs == 0 || self.batch_timeout_secs == 0 {
            return Err(EngineError::ConfigError("timeouts must be positive".into()));
        }
        Ok(())
    }

    /// Budget for one remote request in the given mode.
    pub fn request_timeout(&self, is_batch: bool) -> Duration {
        if is_batch {
            Duration::from_secs(self.batch_timeout_secs)
        } else {
            Duration::from_secs(self.request_timeout_secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_location, MarketDataLocation::NYC);
        assert_eq!(config.request_timeout(false), Duration::from_secs(180));
        assert_eq!(config.request_timeout(true), Duration::from_secs(3600));
        assert!(config.default_calendars.is_empty());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            default_location = "LDN"
            batch_timeout_secs = 7200
            default_calendars = ["LDN", "TARGET"]
            "#,
        )
        .unwrap();

        assert_eq!(config.default_location, MarketDataLocation::LDN);
        assert_eq!(config.request_timeout_secs, 180);
        assert_eq!(config.request_timeout(true), Duration::from_secs(7200));
        assert_eq!(config.default_calendars, vec!["LDN", "TARGET"]);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = EngineConfig::from_toml_str("max_concurrent_requests = 0").unwrap_err();
        assert!(matches!(err, EngineError::ConfigError(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs = 30").unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.request_timeout(false), Duration::from_secs(30));
    }

    #[test]
    fn test_missing_file() {
        assert!(EngineConfig::from_file("/nonexistent/hindsight.toml").is_err());
    }
}
