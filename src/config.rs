use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 4000;
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 200;

/// Timing of collection assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Total time an assertion keeps polling before it fails.
    pub timeout_ms: u64,
    /// Pause between two attempts.
    pub polling_interval_ms: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            polling_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
        }
    }
}

impl VerifyConfig {
    /// Load from a JSON file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerifyError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = VerifyConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(4));
        assert_eq!(config.polling_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "timeout_ms": 10000 }}"#).unwrap();

        let config = VerifyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.timeout_ms, 10000);
        assert_eq!(config.polling_interval_ms, DEFAULT_POLLING_INTERVAL_MS);
    }

    #[test]
    fn test_from_file_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(VerifyConfig::from_file(file.path()), Err(VerifyError::Json(_))));
    }

    #[test]
    fn test_from_missing_file() {
        let result = VerifyConfig::from_file("/nonexistent/chrome-verify.json");
        assert!(matches!(result, Err(VerifyError::Io(_))));
    }

    #[test]
    fn test_builders() {
        let config = VerifyConfig::default()
            .with_timeout(Duration::from_millis(1500))
            .with_polling_interval(Duration::from_millis(50));
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.polling_interval_ms, 50);
    }
}
