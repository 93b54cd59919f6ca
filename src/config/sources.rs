use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "TUNEDROP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/tunedrop.toml";
const ENV_PREFIX: &str = "TUNEDROP";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load(explicit_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = explicit_path.unwrap_or_else(|| {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });

    let mut config = load_from_sources(config_path)?;
    apply_plain_env(&mut config);

    Ok(config)
}

/// Honour the unprefixed `PORT` and `PASSWORD` variables
///
/// An empty `PASSWORD` counts as unset.
fn apply_plain_env(config: &mut Config) {
    if let Ok(port) = env::var("PORT") {
        match port.parse::<u16>() {
            Ok(port) => config.server.bind_addr.set_port(port),
            Err(_) => tracing::warn!(port = %port, "Ignoring invalid PORT value"),
        }
    }

    if let Ok(password) = env::var("PASSWORD") {
        config.auth.password = Some(password).filter(|value| !value.is_empty());
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // TUNEDROP__SERVER__BIND_ADDR -> server.bind_addr
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .list_separator(",")
            .with_list_parse_key("downloader.args")
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
