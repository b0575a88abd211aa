//! CLI configuration

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Harness configuration loaded from a TOML file, with CLI flags
/// taking precedence over every field.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliConfig {
    /// Service entry name in the registry document
    pub service_name: Option<String>,

    /// Routable endpoint URL of the deployed service
    pub service_url: Option<String>,

    /// Certificate subject name
    pub subject: Option<String>,

    /// Directory holding the certificate bundle
    pub cert_dir: Option<PathBuf>,

    /// Compose file driving the external runner
    pub compose_file: Option<PathBuf>,

    /// Health probe attempts per endpoint
    pub max_attempts: Option<u32>,

    /// Delay between probe attempts, in seconds
    pub retry_delay_secs: Option<u64>,
}

impl CliConfig {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: CliConfig =
                toml::from_str(&contents).map_err(|e| CliError::Config(e.to_string()))?;
            Ok(config)
        } else {
            Ok(CliConfig::default())
        }
    }

    /// Get the default configuration file path
    fn default_config_path() -> CliResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::Config("Cannot find config directory".into()))?;
        Ok(config_dir.join("slipway").join("config.toml"))
    }
}
