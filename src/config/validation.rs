//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend list is non-empty and every address parses as an http URL
//! - Weight list (when present) matches the backend list and has no zeros
//! - Value ranges (interval and probe timeout > 0, bind addresses parse)
//! - An enabled admin API has a real key
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{BalancerConfig, PLACEHOLDER_ADMIN_KEY};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one backend must be configured")]
    NoBackends,

    #[error("{weights} weights configured for {backends} backends")]
    WeightCountMismatch { backends: usize, weights: usize },

    #[error("weight for backend #{index} must be positive")]
    ZeroWeight { index: usize },

    #[error("invalid backend address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid {field} '{value}'")]
    InvalidBindAddress { field: &'static str, value: String },

    #[error("health_check.{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("health_check.path must start with '/'")]
    InvalidProbePath,

    #[error("observability.metrics_path '{0}' must be an absolute path other than '/'")]
    InvalidMetricsPath(String),

    #[error("admin.api_key must be set to a real secret when the admin API is enabled")]
    InsecureAdminKey,
}

/// Parse one backend address. Only plain `http` with an explicit host is accepted.
pub fn parse_backend_address(address: &str) -> Result<Url, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let url = Url::parse(address).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_string()));
    }
    Ok(url)
}

/// Validate pool construction inputs.
pub fn validate_pool(addresses: &[String], weights: Option<&[u32]>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if addresses.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    for address in addresses {
        if let Err(e) = parse_backend_address(address) {
            errors.push(e);
        }
    }

    if let Some(weights) = weights {
        if weights.len() != addresses.len() {
            errors.push(ValidationError::WeightCountMismatch {
                backends: addresses.len(),
                weights: weights.len(),
            });
        }
        for (index, weight) in weights.iter().enumerate() {
            if *weight == 0 {
                errors.push(ValidationError::ZeroWeight { index });
            }
        }
    }

    errors
}

/// Validate a full configuration, collecting every problem.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_pool(&config.backends, config.weights.as_deref());

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.admin.enabled {
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidBindAddress {
                field: "admin.bind_address",
                value: config.admin.bind_address.clone(),
            });
        }
        let key = config.admin.api_key.trim();
        if key.is_empty() || key == PLACEHOLDER_ADMIN_KEY {
            errors.push(ValidationError::InsecureAdminKey);
        }
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration("interval_secs"));
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeout_secs"));
    }
    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::InvalidProbePath);
    }
    let metrics_path = &config.observability.metrics_path;
    if config.observability.metrics_enabled && (!metrics_path.starts_with('/') || metrics_path == "/") {
        errors.push(ValidationError::InvalidMetricsPath(metrics_path.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
