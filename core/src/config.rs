//! Client configuration.
//!
//! Settings come from an optional TOML file, then `FLICKR_*` environment
//! variables override individual fields. Every field has a default except
//! the API key, which `validate` insists on.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::client::DEFAULT_BASE_URL;
use crate::error::ConfigError;
use crate::types::DEFAULT_IMAGE_HOST;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub image_host: String,
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            image_host: DEFAULT_IMAGE_HOST.to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

/// Per-call transport timeouts, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub connect_secs: u64,
    pub read_secs: u64,
    pub write_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: 3,
            read_secs: 20,
            write_secs: 25,
        }
    }
}

impl Timeouts {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }
}

impl ClientConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read `path` if given, apply environment overrides, and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("FLICKR_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("FLICKR_API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = lookup("FLICKR_IMAGE_HOST") {
            self.image_host = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingParameter("api_key"));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingParameter("base_url"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_service_expectations() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.flickr.com/services/rest");
        assert_eq!(config.image_host, "live.staticflickr.com");
        assert_eq!(config.timeouts.connect(), Duration::from_secs(3));
        assert_eq!(config.timeouts.read(), Duration::from_secs(20));
        assert_eq!(config.timeouts.write(), Duration::from_secs(25));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_key = "abc"

            [timeouts]
            read_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.timeouts.read_secs, 5);
        assert_eq!(config.timeouts.connect_secs, 3);
        assert_eq!(config.image_host, "live.staticflickr.com");
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = ClientConfig::from_toml_str("api_key = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("FLICKR_API_KEY", "from-env"),
            ("FLICKR_BASE_URL", "http://127.0.0.1:3000/services/rest"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::from_toml_str(r#"api_key = "from-file""#).unwrap();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.base_url, "http://127.0.0.1:3000/services/rest");
        assert_eq!(config.image_host, "live.staticflickr.com");
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let err = ClientConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingParameter("api_key")));
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = ClientConfig::load(Some(Path::new("/nonexistent/flickr.toml"))).unwrap_err();
        match err {
            ConfigError::Read { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/flickr.toml"))
            }
            other => panic!("expected Read error, got {other:?}"),
        }
    }
}
