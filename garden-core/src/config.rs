//! Garden configuration.

use std::time::Duration;
use thiserror::Error;

pub const ENV_API_KEY: &str = "MEMORY_GARDEN_API_KEY";
pub const ENV_FALLBACK_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_API_BASE: &str = "MEMORY_GARDEN_API_BASE";
pub const ENV_MODEL: &str = "MEMORY_GARDEN_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "MEMORY_GARDEN_TIMEOUT_SECS";

/// Errors from reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

/// Configuration for a garden session.
#[derive(Debug, Clone, PartialEq)]
pub struct GardenConfig {
    /// Key for the language model API. Without one the AI features are off.
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    pub api_base: String,

    /// Model used for all three gateway operations.
    pub model: String,

    /// Upper bound on a whole request.
    pub request_timeout: Duration,

    /// Upper bound on establishing the connection.
    pub connect_timeout: Duration,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: chat::DEFAULT_API_BASE.to_string(),
            model: chat::DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(15),
        }
    }
}

impl GardenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        config.api_key = get(ENV_API_KEY).or_else(|| get(ENV_FALLBACK_API_KEY));
        if let Some(base) = get(ENV_API_BASE) {
            config.api_base = base;
        }
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidNumber {
                var: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            if secs == 0 {
                return Err(ConfigError::Zero {
                    var: ENV_TIMEOUT_SECS,
                });
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Set the API key. A blank key clears it.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = (!key.trim().is_empty()).then(|| key.trim().to_string());
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GardenConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, GardenConfig::default());
        assert!(!config.has_api_key());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_key_falls_back_to_openai_var() {
        let config = GardenConfig::from_lookup(lookup(&[(ENV_FALLBACK_API_KEY, "sk-a")])).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-a"));

        let config = GardenConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "sk-garden"),
            (ENV_FALLBACK_API_KEY, "sk-a"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-garden"));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config =
            GardenConfig::from_lookup(lookup(&[(ENV_API_KEY, "  "), (ENV_MODEL, "")])).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.model, chat::DEFAULT_MODEL);
    }

    #[test]
    fn test_overrides() {
        let config = GardenConfig::from_lookup(lookup(&[
            (ENV_API_BASE, "http://localhost:8080/v1"),
            (ENV_MODEL, "local-model"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "http://localhost:8080/v1");
        assert_eq!(config.model, "local-model");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_timeout() {
        assert_eq!(
            GardenConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])),
            Err(ConfigError::InvalidNumber {
                var: ENV_TIMEOUT_SECS,
                value: "soon".to_string()
            })
        );
        assert_eq!(
            GardenConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "0")])),
            Err(ConfigError::Zero {
                var: ENV_TIMEOUT_SECS
            })
        );
    }

    #[test]
    fn test_with_api_key_trims() {
        let config = GardenConfig::new().with_api_key("  sk-x ");
        assert_eq!(config.api_key.as_deref(), Some("sk-x"));
        assert!(!GardenConfig::new().with_api_key("").has_api_key());
    }
}
