//! # Configuration Management
//!
//! Centralized configuration for allocators, pooled-object registries and
//! logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()` (`WIRE_BUFFERS_*`)
//!
//! ## Defaults
//! - Buffers start at [`DEFAULT_BUFFER_SIZE`] bytes and double on overflow
//! - Pedantic ownership checks are on; turning them off downgrades double
//!   release and use-after-release to logged warnings
//! - Arrays up to 1 MiB are pooled, eight per power-of-two bucket

use crate::error::{BufferError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;

/// Size of buffers handed out by `acquire_default`
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Smallest array the pool rents
pub const MIN_ARRAY_SIZE: usize = 16;

/// Largest array kept in the pool after release (1 MiB)
pub const MAX_POOLED_ARRAY_SIZE: usize = 1024 * 1024;

/// Largest buffer an allocator will back (16 MiB)
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Arrays kept per power-of-two bucket
pub const MAX_ARRAYS_PER_BUCKET: usize = 8;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BufferConfig {
    /// Allocator and array pool configuration
    #[serde(default)]
    pub allocator: AllocatorConfig,

    /// Pooled reader/writer registry configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BufferConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BufferError::ConfigError(format!(
                "Failed to open config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse a TOML document. Missing tables and keys keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BufferError::ConfigError(format!("Failed to parse TOML config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(size) = std::env::var("WIRE_BUFFERS_DEFAULT_BUFFER_SIZE") {
            config.allocator.default_buffer_size = size.parse::<usize>().map_err(|e| {
                BufferError::ConfigError(format!("Invalid WIRE_BUFFERS_DEFAULT_BUFFER_SIZE: {e}"))
            })?;
        }

        if let Ok(size) = std::env::var("WIRE_BUFFERS_MAX_BUFFER_SIZE") {
            config.allocator.max_buffer_size = size.parse::<usize>().map_err(|e| {
                BufferError::ConfigError(format!("Invalid WIRE_BUFFERS_MAX_BUFFER_SIZE: {e}"))
            })?;
        }

        if let Ok(flag) = std::env::var("WIRE_BUFFERS_PEDANTIC") {
            config.allocator.pedantic = parse_flag("WIRE_BUFFERS_PEDANTIC", &flag)?;
        }

        if let Ok(flag) = std::env::var("WIRE_BUFFERS_DYNAMIC_GROWTH") {
            config.allocator.dynamic_growth = parse_flag("WIRE_BUFFERS_DYNAMIC_GROWTH", &flag)?;
        }

        if let Ok(flag) = std::env::var("WIRE_BUFFERS_TRACK_ORIGINS") {
            config.registry.track_origins = parse_flag("WIRE_BUFFERS_TRACK_ORIGINS", &flag)?;
        }

        if let Ok(level) = std::env::var("WIRE_BUFFERS_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                BufferError::ConfigError(format!("Invalid WIRE_BUFFERS_LOG_LEVEL: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Annotated TOML template listing every key at its default value
    pub fn example_config() -> String {
        let BufferConfig {
            allocator: a,
            registry: r,
            logging: l,
        } = Self::default();
        format!(
            "# wire-buffers configuration\n\
             \n\
             [allocator]\n\
             # capacity of acquire_default buffers, rounded up to a power of two\n\
             default_buffer_size = {}\n\
             # smallest array rented from the pool\n\
             min_array_size = {}\n\
             # arrays above this size are dropped on release instead of pooled\n\
             max_pooled_array_size = {}\n\
             max_arrays_per_bucket = {}\n\
             # hard ceiling for a single buffer, must be a power of two\n\
             max_buffer_size = {}\n\
             # double the buffer when a cursor write does not fit\n\
             dynamic_growth = {}\n\
             # double release and use-after-release are errors instead of warnings\n\
             pedantic = {}\n\
             zero_on_release = {}\n\
             \n\
             [registry]\n\
             # record the call site of every pooled writer/reader acquire\n\
             track_origins = {}\n\
             max_free_objects = {}\n\
             \n\
             [logging]\n\
             app_name = \"{}\"\n\
             # trace, debug, info, warn or error\n\
             log_level = \"{}\"\n\
             json_format = {}\n",
            a.default_buffer_size,
            a.min_array_size,
            a.max_pooled_array_size,
            a.max_arrays_per_bucket,
            a.max_buffer_size,
            a.dynamic_growth,
            a.pedantic,
            a.zero_on_release,
            r.track_origins,
            r.max_free_objects,
            l.app_name,
            l.log_level.as_str().to_ascii_lowercase(),
            l.json_format,
        )
    }

    /// Validate, then write the configuration as TOML.
    ///
    /// An invalid configuration is never written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate_strict()?;
        let content = toml::to_string(self)
            .map_err(|e| BufferError::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path.as_ref(), content).map_err(BufferError::from)
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.allocator.validate());
        errors.extend(self.registry.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Like [`validate`](Self::validate), folding every problem into one error
    pub fn validate_strict(&self) -> Result<()> {
        match self.validate().as_slice() {
            [] => Ok(()),
            problems => Err(BufferError::ConfigError(format!(
                "Configuration validation failed with {} problem(s): {}",
                problems.len(),
                problems.join("; ")
            ))),
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(BufferError::ConfigError(format!(
            "Invalid {name}: '{other}' (expected true/false)"
        ))),
    }
}

/// Allocator and array pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Capacity of buffers acquired without an explicit size
    pub default_buffer_size: usize,

    /// Smallest array rented from the pool
    pub min_array_size: usize,

    /// Largest array kept in the pool after release
    pub max_pooled_array_size: usize,

    /// Arrays kept per power-of-two bucket
    pub max_arrays_per_bucket: usize,

    /// Largest buffer capacity the allocator will back
    pub max_buffer_size: usize,

    /// Whether writes past capacity grow the buffer instead of failing
    pub dynamic_growth: bool,

    /// Whether double release and use-after-release are errors
    pub pedantic: bool,

    /// Whether arrays are zeroed before going back into the pool
    pub zero_on_release: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            default_buffer_size: DEFAULT_BUFFER_SIZE,
            min_array_size: MIN_ARRAY_SIZE,
            max_pooled_array_size: MAX_POOLED_ARRAY_SIZE,
            max_arrays_per_bucket: MAX_ARRAYS_PER_BUCKET,
            max_buffer_size: MAX_BUFFER_SIZE,
            dynamic_growth: true,
            pedantic: true,
            zero_on_release: false,
        }
    }
}

impl AllocatorConfig {
    /// Validate allocator configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_buffer_size == 0 {
            errors.push("Max buffer size cannot be 0".to_string());
        } else if !self.max_buffer_size.is_power_of_two() {
            errors.push(format!(
                "Max buffer size must be a power of two: {}",
                self.max_buffer_size
            ));
        }

        if self.default_buffer_size == 0 {
            errors.push("Default buffer size must be greater than 0".to_string());
        } else if self.default_buffer_size > self.max_buffer_size {
            errors.push(format!(
                "Default buffer size {} exceeds max buffer size {}",
                self.default_buffer_size, self.max_buffer_size
            ));
        }

        if self.min_array_size == 0 {
            errors.push("Min array size must be greater than 0".to_string());
        } else if self.min_array_size > self.max_buffer_size {
            errors.push(format!(
                "Min array size {} exceeds max buffer size {}",
                self.min_array_size, self.max_buffer_size
            ));
        }

        if self.max_pooled_array_size > self.max_buffer_size {
            errors.push(format!(
                "Max pooled array size {} exceeds max buffer size {}",
                self.max_pooled_array_size, self.max_buffer_size
            ));
        }

        if self.max_arrays_per_bucket > 10_000 {
            errors.push(format!(
                "Max arrays per bucket very high: {} (pooled memory is never trimmed)",
                self.max_arrays_per_bucket
            ));
        }

        errors
    }
}

/// Pooled reader/writer registry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Whether each acquisition records its caller location for audits
    pub track_origins: bool,

    /// Released objects kept for reuse; the rest are dropped
    pub max_free_objects: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            track_origins: true,
            max_free_objects: 256,
        }
    }
}

impl RegistryConfig {
    /// Validate registry configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_free_objects > 1_000_000 {
            errors.push(format!(
                "Max free objects too large: {} (max recommended: 1,000,000)",
                self.max_free_objects
            ));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("wire-buffers"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// `tracing::Level` as a lowercase string (`"info"`), parsed case-insensitively
mod log_level_serde {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use tracing::Level;

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.as_str().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| de::Error::custom(format!("Invalid log level: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(BufferConfig::default().validate().is_empty());
        assert!(BufferConfig::default().validate_strict().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("WIRE_BUFFERS_DEFAULT_BUFFER_SIZE", "512");
        std::env::set_var("WIRE_BUFFERS_PEDANTIC", "off");
        std::env::set_var("WIRE_BUFFERS_LOG_LEVEL", "debug");
        let config = BufferConfig::from_env().unwrap();
        assert_eq!(config.allocator.default_buffer_size, 512);
        assert!(!config.allocator.pedantic);
        assert_eq!(config.logging.log_level, Level::DEBUG);

        std::env::set_var("WIRE_BUFFERS_PEDANTIC", "sometimes");
        assert!(BufferConfig::from_env().is_err());

        for name in [
            "WIRE_BUFFERS_DEFAULT_BUFFER_SIZE",
            "WIRE_BUFFERS_PEDANTIC",
            "WIRE_BUFFERS_LOG_LEVEL",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = BufferConfig::from_toml(
            r#"
            [allocator]
            pedantic = false
            default_buffer_size = 16

            [logging]
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert!(!config.allocator.pedantic);
        assert_eq!(config.allocator.default_buffer_size, 16);
        assert_eq!(config.allocator.max_buffer_size, MAX_BUFFER_SIZE);
        assert_eq!(config.logging.log_level, Level::DEBUG);
        assert!(config.registry.track_origins);
    }

    #[test]
    fn test_example_config_parses_back_to_defaults() {
        let text = BufferConfig::example_config();
        assert!(text.contains("# trace, debug, info, warn or error"));

        let config = BufferConfig::from_toml(&text).unwrap();
        let defaults = BufferConfig::default();
        assert_eq!(config.allocator.default_buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.allocator.max_buffer_size, defaults.allocator.max_buffer_size);
        assert_eq!(config.allocator.pedantic, defaults.allocator.pedantic);
        assert_eq!(config.registry.max_free_objects, defaults.registry.max_free_objects);
        assert_eq!(config.logging.app_name, defaults.logging.app_name);
        assert_eq!(config.logging.log_level, defaults.logging.log_level);
    }

    #[test]
    fn test_save_refuses_invalid_config() {
        let config = BufferConfig::default_with_overrides(|c| c.allocator.min_array_size = 0);
        let path = std::env::temp_dir().join(format!("wire-buffers-invalid-{}.toml", std::process::id()));
        assert!(config.save_to_file(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let config = BufferConfig::from_toml("[logging]\nlog_level = \"WARN\"\n").unwrap();
        assert_eq!(config.logging.log_level, Level::WARN);
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("log_level = \"warn\""));
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("X", "TRUE").unwrap());
        assert!(!parse_flag("X", "off").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }
}
