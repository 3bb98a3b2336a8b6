//! # Logging
//!
//! Installs a `tracing-subscriber` fmt subscriber built from [`LoggingConfig`].
//!
//! The level from the config is the default directive; `RUST_LOG` still wins
//! for any target it names. Installing twice is an error, not a panic, so
//! tests and embedding applications can call this freely.

use tracing::info;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use crate::config::LoggingConfig;
use crate::error::{BufferError, Result};

/// Build the env filter for `config`
pub fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .from_env_lossy()
}

/// Install the global subscriber described by `config`
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(build_env_filter(config));

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.map_err(|e| BufferError::ConfigError(format!("Failed to install logger: {e}")))?;

    info!(
        app = %config.app_name,
        level = %config.log_level,
        json = config.json_format,
        "Logging initialized"
    );
    Ok(())
}
