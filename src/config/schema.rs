//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::load_balancer::Strategy;

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend base addresses (e.g., "http://10.0.0.5:8081"), in pool order.
    pub backends: Vec<String>,

    /// Optional weights, one per backend. Only consulted by the weighted strategy.
    pub weights: Option<Vec<u32>>,

    /// Backend selection strategy.
    pub strategy: Strategy,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            backends: vec![
                "http://backend1:8081".to_string(),
                "http://backend2:8082".to_string(),
                "http://backend3:8083".to_string(),
            ],
            weights: None,
            strategy: Strategy::default(),
            health_check: HealthCheckConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,

    /// Path to probe, relative to the backend address.
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            timeout_secs: 5,
            path: "/".to_string(),
        }
    }
}

/// Timeout configuration for upstream connections.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds. 0 disables it.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connect_secs: 5 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset (e.g., "info" or "pool_proxy=debug").
    pub log_level: String,

    /// Install the Prometheus recorder and expose it on the listener.
    pub metrics_enabled: bool,

    /// Path the metrics are served on. Requests to it are not proxied.
    pub metrics_path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "pool_proxy=info,tower_http=info".to_string(),
            metrics_enabled: true,
            metrics_path: "/metrics".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

/// Default admin key. Rejected by validation whenever the admin API is enabled.
pub const PLACEHOLDER_ADMIN_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_ADMIN_KEY.to_string(),
            bind_address: "127.0.0.1:8001".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: BalancerConfig = toml::from_str(
            r#"
            backends = ["http://127.0.0.1:9001", "http://127.0.0.1:9002"]
            weights = [1, 4]
            strategy = "weighted_round_robin"

            [health_check]
            interval_secs = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.weights, Some(vec![1, 4]));
        assert_eq!(config.strategy, Strategy::WeightedRoundRobin);
        assert_eq!(config.health_check.interval_secs, 2);
        assert_eq!(config.health_check.timeout_secs, 5);
        assert_eq!(config.health_check.path, "/");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_default_matches_compose_layout() {
        let config = BalancerConfig::default();
        assert_eq!(config.backends.len(), 3);
        assert_eq!(config.strategy, Strategy::RoundRobin);
        assert!(config.weights.is_none());
    }
}
