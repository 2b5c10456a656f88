//! Navigator configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for a navigation controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Path prefix for content requests (`GET {content_endpoint}{location}`).
    pub content_endpoint: String,
    /// Path prefix for server action requests (`POST {action_endpoint}{location}`).
    pub action_endpoint: String,
    /// Replace the cached handle for a popped entry once its refetch drains.
    pub refresh_on_pop: bool,
    /// Upper bound on cached entries. `None` keeps every entry for the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_capacity: Option<usize>,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            content_endpoint: "/rsc".to_string(),
            action_endpoint: "/action".to_string(),
            refresh_on_pop: false,
            cache_capacity: None,
        }
    }
}

impl NavigatorConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content endpoint prefix.
    pub fn with_content_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.content_endpoint = endpoint.into();
        self
    }

    /// Set the action endpoint prefix.
    pub fn with_action_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.action_endpoint = endpoint.into();
        self
    }

    /// Enable or disable refreshing popped entries.
    pub fn with_refresh_on_pop(mut self, enabled: bool) -> Self {
        self.refresh_on_pop = enabled;
        self
    }

    /// Bound the content cache.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Load config from a file. `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse from a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, endpoint) in [
            ("content_endpoint", &self.content_endpoint),
            ("action_endpoint", &self.action_endpoint),
        ] {
            if !endpoint.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "{} must start with '/': {:?}",
                    name, endpoint
                )));
            }
            if endpoint.len() > 1 && endpoint.ends_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "{} must not end with '/': {:?}",
                    name, endpoint
                )));
            }
        }

        if self.cache_capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "cache_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NavigatorConfig::default();

        assert_eq!(config.content_endpoint, "/rsc");
        assert_eq!(config.action_endpoint, "/action");
        assert!(!config.refresh_on_pop);
        assert!(config.cache_capacity.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = NavigatorConfig::new()
            .with_content_endpoint("/flight")
            .with_action_endpoint("/act")
            .with_refresh_on_pop(true)
            .with_cache_capacity(16);

        assert_eq!(config.content_endpoint, "/flight");
        assert_eq!(config.action_endpoint, "/act");
        assert!(config.refresh_on_pop);
        assert_eq!(config.cache_capacity, Some(16));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = NavigatorConfig::from_toml_str("refresh_on_pop = true\n").unwrap();

        assert!(config.refresh_on_pop);
        assert_eq!(config.content_endpoint, "/rsc");
    }

    #[test]
    fn test_json_config() {
        let config =
            NavigatorConfig::from_json_str(r#"{"cache_capacity": 4, "action_endpoint": "/a"}"#)
                .unwrap();

        assert_eq!(config.cache_capacity, Some(4));
        assert_eq!(config.action_endpoint, "/a");
    }

    #[test]
    fn test_validate_rejects_relative_endpoint() {
        let config = NavigatorConfig::new().with_content_endpoint("rsc");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_trailing_slash() {
        let config = NavigatorConfig::new().with_action_endpoint("/action/");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = NavigatorConfig::new().with_cache_capacity(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = NavigatorConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("rsc-core-config-{}.toml", std::process::id()));
        std::fs::write(&path, "content_endpoint = \"/stream\"\ncache_capacity = 8\n").unwrap();

        let config = NavigatorConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.content_endpoint, "/stream");
        assert_eq!(config.cache_capacity, Some(8));
    }
}
