//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{FederationConfig, DEFAULT_STATUS};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Text format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// `.toml` files are TOML, everything else is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// Load and validate configuration from a YAML or TOML file.
pub fn load_config(path: &Path) -> Result<FederationConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content, ConfigFormat::from_path(path))?;

    validate_config(&config).map_err(ConfigError::Invalid)?;

    Ok(config)
}

/// Parse configuration text and fill in defaults. Does not validate.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<FederationConfig, ConfigError> {
    let mut config: FederationConfig = match format {
        ConfigFormat::Yaml if content.trim().is_empty() => FederationConfig::default(),
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    };

    if config.routers.selector.status.is_empty() {
        config.routers.selector.status = DEFAULT_STATUS.to_string();
    }
    if config
        .routers
        .selector
        .provider
        .as_deref()
        .is_some_and(str::is_empty)
    {
        config.routers.selector.provider = None;
    }

    Ok(config)
}
