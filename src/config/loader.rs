//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::BalancerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<Vec<ValidationError>> for ConfigError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ConfigError::Validation(errors)
    }
}

/// Parse configuration from a TOML string without validating it.
///
/// Callers that apply overrides (the CLI) validate afterwards.
pub fn parse_config(content: &str) -> Result<BalancerConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Read a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<BalancerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Load configuration, apply overrides, then validate.
///
/// Defaults are used when no file is given. Validation runs last so that
/// overrides can fix (or break) what the file says.
pub fn load_config<F>(path: Option<&Path>, overrides: F) -> Result<BalancerConfig, ConfigError>
where
    F: FnOnce(&mut BalancerConfig),
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => BalancerConfig::default(),
    };
    overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}
