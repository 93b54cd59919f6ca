//! Configuration management for tunedrop
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use tunedrop::config::Config;
//!
//! let config = Config::load(None).expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `TUNEDROP__<section>__<key>`
//!
//! Examples:
//! - `TUNEDROP__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `TUNEDROP__DOWNLOADER__OUTPUT_PATH=/srv/music`
//! - `TUNEDROP__DOWNLOADER__ARGS=--itag,141`
//!
//! The plain `PORT` and `PASSWORD` variables are also honoured and override
//! the bind port and the shared secret respectively.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/tunedrop.toml`.
//! This can be overridden using the `TUNEDROP_CONFIG` environment variable
//! or the `--config` flag.

mod models;
mod sources;
mod validation;

pub use models::{AuthConfig, Config, DownloaderConfig, ServerConfig};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. `PORT` / `PASSWORD`
    /// 2. Environment variables (`TUNEDROP__*`, including a `.env` file)
    /// 3. TOML file (`explicit_path`, else `TUNEDROP_CONFIG`, else `config/tunedrop.toml`)
    /// 4. Default values
    pub fn load(explicit_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(explicit_path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Skips `.env` and the plain `PORT` / `PASSWORD` variables, which keeps
    /// tests independent of the host environment.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
