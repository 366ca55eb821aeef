//! Configuration management for paramforge
//!
//! Settings load from environment variables with sensible defaults; command
//! line flags override individual fields afterwards.
//!
//! # Environment Variables
//!
//! - `PARAMFORGE_OLLAMA_HOST`: text-generation endpoint - default: `OLLAMA_HOST` or "http://localhost:11434"
//! - `PARAMFORGE_CONVERSION_MODEL`: model for instruction conversion - default: "qwen2.5-coder:7b"
//! - `PARAMFORGE_GENERATION_MODEL`: model for code generation - default: "qwen2.5-coder:7b"
//! - `PARAMFORGE_STORE_URL`: exemplar store endpoint - default: "http://localhost:8000"
//! - `PARAMFORGE_COLLECTION`: exemplar collection - default: "fusion360_code_examples"
//! - `PARAMFORGE_CATEGORY`: restrict retrieval to one category - default: unset
//! - `PARAMFORGE_RESULT_COUNT`: exemplars per query - default: "5"
//! - `PARAMFORGE_CONVERSION_TIMEOUT`: seconds - default: "30"
//! - `PARAMFORGE_GENERATION_TIMEOUT`: seconds - default: "120"
//! - `PARAMFORGE_OPERATOR_TIMEOUT`: seconds to wait for manual input - default: "300"
//! - `PARAMFORGE_MAX_EXEMPLAR_CHARS`: per-exemplar code bound - default: "4000"
//! - `PARAMFORGE_LOG_LEVEL`: logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use paramforge::ParamforgeConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ParamforgeConfig::default();
//! config.validate()?;
//! let generator = config.create_generator()?;
//! let store = config.create_store()?;
//! # Ok(())
//! # }
//! ```

use crate::llm::{BackendError, OllamaClient};
use crate::retrieval::{ChromaStore, StoreError, DEFAULT_MAX_EXEMPLAR_CHARS};
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "qwen2.5-coder:7b";
const DEFAULT_STORE_URL: &str = "http://localhost:8000";
const DEFAULT_COLLECTION: &str = "fusion360_code_examples";
pub const DEFAULT_RESULT_COUNT: usize = 5;
pub const DEFAULT_CONVERSION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_OPERATOR_TIMEOUT_SECS: u64 = 300;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Text-generation client could not be built
    #[error("Backend initialization failed: {0}")]
    BackendInitError(#[from] BackendError),

    /// Exemplar store client could not be built
    #[error("Store initialization failed: {0}")]
    StoreInitError(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamforgeConfig {
    pub ollama_host: String,
    pub conversion_model: String,
    pub generation_model: String,
    pub store_url: String,
    pub collection: String,
    pub category: Option<String>,
    pub result_count: usize,
    pub conversion_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    pub operator_timeout_secs: u64,
    pub max_exemplar_chars: usize,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_string(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl Default for ParamforgeConfig {
    /// Loads from `PARAMFORGE_*` environment variables with defaults
    fn default() -> Self {
        let ollama_host = env_string("PARAMFORGE_OLLAMA_HOST")
            .or_else(|| env_string("OLLAMA_HOST"))
            .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());

        Self {
            ollama_host,
            conversion_model: env_string("PARAMFORGE_CONVERSION_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            generation_model: env_string("PARAMFORGE_GENERATION_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            store_url: env_string("PARAMFORGE_STORE_URL")
                .unwrap_or_else(|| DEFAULT_STORE_URL.to_string()),
            collection: env_string("PARAMFORGE_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            category: env_string("PARAMFORGE_CATEGORY"),
            result_count: env_parse("PARAMFORGE_RESULT_COUNT", DEFAULT_RESULT_COUNT),
            conversion_timeout_secs: env_parse(
                "PARAMFORGE_CONVERSION_TIMEOUT",
                DEFAULT_CONVERSION_TIMEOUT_SECS,
            ),
            generation_timeout_secs: env_parse(
                "PARAMFORGE_GENERATION_TIMEOUT",
                DEFAULT_GENERATION_TIMEOUT_SECS,
            ),
            operator_timeout_secs: env_parse(
                "PARAMFORGE_OPERATOR_TIMEOUT",
                DEFAULT_OPERATOR_TIMEOUT_SECS,
            ),
            max_exemplar_chars: env_parse(
                "PARAMFORGE_MAX_EXEMPLAR_CHARS",
                DEFAULT_MAX_EXEMPLAR_CHARS,
            ),
            log_level: env_string("PARAMFORGE_LOG_LEVEL")
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
        }
    }
}

impl ParamforgeConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` naming the first bad field
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, secs) in [
            ("Conversion timeout", self.conversion_timeout_secs),
            ("Generation timeout", self.generation_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be at least 1 second",
                    name
                )));
            }
            if secs > 600 {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} cannot exceed 10 minutes",
                    name
                )));
            }
        }

        if !(1..=3600).contains(&self.operator_timeout_secs) {
            return Err(ConfigError::ValidationFailed(
                "Operator timeout must be between 1 second and 1 hour".to_string(),
            ));
        }

        if !(1..=20).contains(&self.result_count) {
            return Err(ConfigError::ValidationFailed(format!(
                "Result count must be between 1 and 20, got {}",
                self.result_count
            )));
        }

        if self.max_exemplar_chars < 256 {
            return Err(ConfigError::ValidationFailed(
                "Max exemplar chars must be at least 256".to_string(),
            ));
        }

        for (name, url) in [("Ollama host", &self.ollama_host), ("Store URL", &self.store_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be an http(s) URL: {}",
                    name, url
                )));
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_secs(self.conversion_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn operator_timeout(&self) -> Duration {
        Duration::from_secs(self.operator_timeout_secs)
    }

    /// Creates the Ollama client used for both conversion and generation.
    ///
    /// The client-level timeout is the larger of the two; each request
    /// carries its own tighter bound.
    pub fn create_generator(&self) -> Result<Arc<OllamaClient>, ConfigError> {
        let timeout = self.conversion_timeout().max(self.generation_timeout());
        let client =
            OllamaClient::with_timeout(self.ollama_host.clone(), self.generation_model.clone(), timeout)?;
        Ok(Arc::new(client))
    }

    pub fn create_store(&self) -> Result<Arc<ChromaStore>, ConfigError> {
        let store = ChromaStore::with_timeout(
            self.store_url.clone(),
            self.collection.clone(),
            self.conversion_timeout(),
        )?;
        Ok(Arc::new(store))
    }
}

impl fmt::Display for ParamforgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Paramforge Configuration:")?;
        writeln!(f, "  Ollama Host: {}", self.ollama_host)?;
        writeln!(f, "  Conversion Model: {}", self.conversion_model)?;
        writeln!(f, "  Generation Model: {}", self.generation_model)?;
        writeln!(f, "  Store URL: {}", self.store_url)?;
        writeln!(f, "  Collection: {}", self.collection)?;
        if let Some(ref category) = self.category {
            writeln!(f, "  Category: {}", category)?;
        }
        writeln!(f, "  Result Count: {}", self.result_count)?;
        writeln!(f, "  Conversion Timeout: {}s", self.conversion_timeout_secs)?;
        writeln!(f, "  Generation Timeout: {}s", self.generation_timeout_secs)?;
        writeln!(f, "  Operator Timeout: {}s", self.operator_timeout_secs)?;
        writeln!(f, "  Max Exemplar Chars: {}", self.max_exemplar_chars)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TextGenerator;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn valid() -> ParamforgeConfig {
        ParamforgeConfig {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            conversion_model: DEFAULT_MODEL.to_string(),
            generation_model: DEFAULT_MODEL.to_string(),
            store_url: DEFAULT_STORE_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            category: None,
            result_count: 5,
            conversion_timeout_secs: 30,
            generation_timeout_secs: 120,
            operator_timeout_secs: 300,
            max_exemplar_chars: 4000,
            log_level: "info".to_string(),
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = vec![
            EnvGuard::unset("PARAMFORGE_OLLAMA_HOST"),
            EnvGuard::unset("OLLAMA_HOST"),
            EnvGuard::unset("PARAMFORGE_CONVERSION_MODEL"),
            EnvGuard::unset("PARAMFORGE_RESULT_COUNT"),
            EnvGuard::unset("PARAMFORGE_CATEGORY"),
            EnvGuard::unset("PARAMFORGE_GENERATION_TIMEOUT"),
            EnvGuard::set("PARAMFORGE_LOG_LEVEL", DEFAULT_LOG_LEVEL),
        ];

        let config = ParamforgeConfig::default();

        assert_eq!(config.ollama_host, DEFAULT_OLLAMA_HOST);
        assert_eq!(config.conversion_model, DEFAULT_MODEL);
        assert_eq!(config.result_count, DEFAULT_RESULT_COUNT);
        assert_eq!(config.generation_timeout(), Duration::from_secs(120));
        assert!(config.category.is_none());
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("PARAMFORGE_OLLAMA_HOST", "http://gpu-box:11434"),
            EnvGuard::set("PARAMFORGE_GENERATION_MODEL", "codellama"),
            EnvGuard::set("PARAMFORGE_CATEGORY", "fusion360_basic"),
            EnvGuard::set("PARAMFORGE_RESULT_COUNT", "3"),
            EnvGuard::set("PARAMFORGE_OPERATOR_TIMEOUT", "45"),
            EnvGuard::set("PARAMFORGE_LOG_LEVEL", "DEBUG"),
        ];

        let config = ParamforgeConfig::default();

        assert_eq!(config.ollama_host, "http://gpu-box:11434");
        assert_eq!(config.generation_model, "codellama");
        assert_eq!(config.category.as_deref(), Some("fusion360_basic"));
        assert_eq!(config.result_count, 3);
        assert_eq!(config.operator_timeout(), Duration::from_secs(45));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_ollama_host_fallback_and_bad_numbers() {
        let _guards = vec![
            EnvGuard::unset("PARAMFORGE_OLLAMA_HOST"),
            EnvGuard::set("OLLAMA_HOST", "http://other:11434"),
            EnvGuard::set("PARAMFORGE_CONVERSION_TIMEOUT", "soon"),
        ];

        let config = ParamforgeConfig::default();
        assert_eq!(config.ollama_host, "http://other:11434");
        assert_eq!(config.conversion_timeout_secs, DEFAULT_CONVERSION_TIMEOUT_SECS);
    }

    #[test]
    fn test_configuration_validation_valid() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_configuration_validation_failures() {
        let cases: Vec<fn(&mut ParamforgeConfig)> = vec![
            |c| c.conversion_timeout_secs = 0,
            |c| c.generation_timeout_secs = 601,
            |c| c.operator_timeout_secs = 0,
            |c| c.operator_timeout_secs = 3601,
            |c| c.result_count = 0,
            |c| c.result_count = 21,
            |c| c.max_exemplar_chars = 255,
            |c| c.store_url = "localhost:8000".to_string(),
            |c| c.log_level = "invalid".to_string(),
        ];

        for mutate in cases {
            let mut config = valid();
            mutate(&mut config);
            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationFailed(_))),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn test_create_clients() {
        let config = valid();
        let generator = config.create_generator().unwrap();
        assert!(generator
            .model_info()
            .unwrap()
            .contains("qwen2.5-coder:7b"));

        let store = config.create_store().unwrap();
        assert_eq!(store.collection(), DEFAULT_COLLECTION);
    }

    #[test]
    fn test_store_client_follows_conversion_timeout() {
        let config = ParamforgeConfig {
            conversion_timeout_secs: 7,
            ..valid()
        };
        let store = config.create_store().unwrap();
        assert_eq!(store.timeout(), Duration::from_secs(7));
    }

    #[test]
    fn test_config_display() {
        let display = format!("{}", valid());
        assert!(display.contains("Paramforge Configuration:"));
        assert!(display.contains("Operator Timeout: 300s"));
    }
}
