//! Configuration loading and resolution
//!
//! Settings come from, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! Tiers 1 and 2 arrive together as [`ConfigOverrides`] (the binary uses
//! clap's `env` support for them). Everything here is bootstrap-only: the
//! service must restart to pick up changes.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_MODEL_PATH: &str = "churn_model.json";
pub const DEFAULT_ENCODERS_PATH: &str = "label_encoders.json";
pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Directory under the platform config dir holding `config.toml`
const CONFIG_DIR_NAME: &str = "telco-churn";

/// TOML configuration file; every key optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub model_path: Option<PathBuf>,
    pub encoders_path: Option<PathBuf>,
    pub session_idle_timeout_secs: Option<u64>,
    pub max_upload_bytes: Option<usize>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging section of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub model_path: Option<PathBuf>,
    pub encoders_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub encoders_path: PathBuf,
    pub session_idle_timeout: Duration,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::resolve(ConfigOverrides::default(), TomlConfig::default())
    }
}

impl ServiceConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Self {
        Self {
            bind_address: overrides
                .bind_address
                .or(toml.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            model_path: overrides
                .model_path
                .or(toml.model_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            encoders_path: overrides
                .encoders_path
                .or(toml.encoders_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ENCODERS_PATH)),
            session_idle_timeout: Duration::from_secs(
                toml.session_idle_timeout_secs
                    .unwrap_or(DEFAULT_SESSION_IDLE_TIMEOUT_SECS),
            ),
            max_upload_bytes: toml.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            log_level: overrides
                .log_level
                .or(toml.logging.level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Validate values that cannot be expressed in the types
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.trim().is_empty() {
            return Err(Error::Config("bind_address must not be empty".to_string()));
        }
        if self.session_idle_timeout.is_zero() {
            return Err(Error::Config(
                "session_idle_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// `host:port` string for the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Default location of the TOML file for this platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join("config.toml"))
}

/// Parse a TOML configuration document
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load the TOML file
///
/// An explicitly requested file must exist. When falling back to the default
/// location, a missing file only produces a warning and empty settings.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match default_config_path() {
            Some(path) => (path, false),
            None => {
                warn!("Could not determine config directory, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    if !path.exists() {
        if required {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        warn!("No config file at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config = parse_toml_config(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.model_path, PathBuf::from("churn_model.json"));
        assert_eq!(config.encoders_path, PathBuf::from("label_encoders.json"));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(3600));
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_beat_toml() {
        let toml = parse_toml_config(
            r#"
            port = 9000
            model_path = "/srv/model.json"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        let overrides = ConfigOverrides {
            port: Some(9100),
            ..Default::default()
        };

        let config = ServiceConfig::resolve(overrides, toml);
        assert_eq!(config.port, 9100);
        assert_eq!(config.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.listen_address(), "127.0.0.1:9100");
    }

    #[test]
    fn test_unknown_toml_key_rejected() {
        let err = parse_toml_config("prot = 1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let toml = parse_toml_config("session_idle_timeout_secs = 0").unwrap();
        let config = ServiceConfig::resolve(ConfigOverrides::default(), toml);
        assert!(config.validate().is_err());
    }
}
