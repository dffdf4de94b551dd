//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.keyfetch/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::endpoints::douban::{DEFAULT_APP_NAME, DEFAULT_HOST, DEFAULT_VERSION};
use crate::network::http::DEFAULT_TIMEOUT_SECS;
use crate::network::{DouBanSettings, HttpOptions};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct KeyfetchConfig {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub douban: DouBanConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TransportConfig {
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DouBanConfig {
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub app_name: Option<String>,
    pub version: Option<String>,
    pub udid: Option<String>,
    pub client: Option<String>,
    pub douban_udid: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub file: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_LOG_FILE: &str = "keyfetch.log";
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub http: HttpOptions,
    pub douban: DouBanSettings,
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
}

/// Values that came in on the command line. `None` = flag not given.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.keyfetch/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".keyfetch").join("config.toml"))
}

/// Load config from `~/.keyfetch/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `KeyfetchConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<KeyfetchConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(KeyfetchConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<KeyfetchConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(KeyfetchConfig::default());
    }

    let contents = fs::read_to_string(path)?;
    let config: KeyfetchConfig = toml::from_str(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# keyfetch configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [transport]
# timeout_secs = 30                  # Or set KEYFETCH_TIMEOUT_SECS
# user_agent = "keyfetch/0.1"        # Or set KEYFETCH_USER_AGENT

# [douban]
# host = "https://api.douban.com/"   # Or set DOUBAN_HOST
# api_key = "..."                    # Or set DOUBAN_API_KEY
# app_name = "radio_iphone"
# version = "115"
# udid = "..."
# client = "s:mobile|y:iOS 10.2|f:115|e:iPhone7,1|m:appstore"
# douban_udid = "..."

# [logging]
# level = "info"                     # Or set KEYFETCH_LOG_LEVEL
#                                    # "off", "error", "warn", "info", "debug", "trace"
# file = "keyfetch.log"
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

fn parse_level(raw: &str) -> Option<LevelFilter> {
    match LevelFilter::from_str(raw) {
        Ok(level) => Some(level),
        Err(_) => {
            warn!("Unknown log level '{}', ignoring", raw);
            None
        }
    }
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &KeyfetchConfig, cli: &CliOverrides) -> ResolvedConfig {
    // Timeout: CLI → env → config → default
    let timeout_secs = cli
        .timeout_secs
        .or_else(|| {
            std::env::var("KEYFETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
        })
        .or(config.transport.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    // User agent: env → config
    let user_agent = std::env::var("KEYFETCH_USER_AGENT")
        .ok()
        .or_else(|| config.transport.user_agent.clone());

    // Douban host and key: env → config → default
    let host = std::env::var("DOUBAN_HOST")
        .ok()
        .or_else(|| config.douban.host.clone())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let api_key = std::env::var("DOUBAN_API_KEY")
        .ok()
        .or_else(|| config.douban.api_key.clone());

    // Log level: CLI → env → config → default
    let log_level = cli
        .log_level
        .as_deref()
        .and_then(parse_level)
        .or_else(|| {
            std::env::var("KEYFETCH_LOG_LEVEL")
                .ok()
                .as_deref()
                .and_then(parse_level)
        })
        .or_else(|| config.logging.level.as_deref().and_then(parse_level))
        .unwrap_or(DEFAULT_LOG_LEVEL);

    ResolvedConfig {
        http: HttpOptions {
            timeout: Duration::from_secs(timeout_secs),
            user_agent,
        },
        douban: DouBanSettings {
            host,
            api_key,
            app_name: config
                .douban
                .app_name
                .clone()
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            version: config
                .douban
                .version
                .clone()
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            udid: config.douban.udid.clone(),
            client: config.douban.client.clone(),
            douban_udid: config.douban.douban_udid.clone(),
        },
        log_level,
        log_file: PathBuf::from(
            config
                .logging
                .file
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        ),
    }
}
