//! pool-proxy: a reverse-proxying HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                  POOL-PROXY                  │
//!     Client Request      │  ┌─────────┐    ┌──────────────────────┐     │
//!     ────────────────────┼─▶│  http   │───▶│    load_balancer     │     │
//!                         │  │ server  │    │ pool + strategy      │     │
//!                         │  └─────────┘    │ (rr / least / wrr)   │     │
//!                         │       ▲         └──────────┬───────────┘     │
//!                         │       │ guarded body       │ guard           │
//!     Client Response     │  ┌────┴────┐    ┌──────────▼───────────┐     │
//!     ◀───────────────────┼──│response │◀───│    hyper client      │◀────┼──── Backend
//!                         │  └─────────┘    └──────────────────────┘     │
//!                         │                            ▲                 │
//!                         │  ┌──────────────┐  liveness│                 │
//!                         │  │health monitor│──────────┘                 │
//!                         │  └──────────────┘                            │
//!                         │  config · observability · lifecycle · admin  │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use pool_proxy::config::loader::load_config;
use pool_proxy::config::{BalancerConfig, ConfigError};
use pool_proxy::lifecycle::startup;
use pool_proxy::observability::logging::init_logging;
use pool_proxy::Strategy;

#[derive(Parser)]
#[command(name = "pool-proxy")]
#[command(about = "Reverse-proxying HTTP load balancer", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "POOL_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8000.
    #[arg(long, env = "POOL_PROXY_BIND")]
    bind: Option<String>,

    /// Backend base address; repeat for each backend, in pool order.
    #[arg(long = "backend", env = "POOL_PROXY_BACKENDS", value_delimiter = ',')]
    backends: Vec<String>,

    /// Backend weight; repeat once per backend.
    #[arg(long = "weight", env = "POOL_PROXY_WEIGHTS", value_delimiter = ',')]
    weights: Vec<u32>,

    /// Backend selection strategy.
    #[arg(long, env = "POOL_PROXY_STRATEGY", value_enum)]
    strategy: Option<Strategy>,

    /// Seconds between health check cycles.
    #[arg(long, env = "POOL_PROXY_HEALTH_INTERVAL")]
    health_interval: Option<u64>,

    /// Per-probe timeout in seconds.
    #[arg(long, env = "POOL_PROXY_PROBE_TIMEOUT")]
    probe_timeout: Option<u64>,
}

impl Cli {
    fn into_config(self) -> Result<BalancerConfig, ConfigError> {
        load_config(self.config.as_deref(), |config| {
            if let Some(bind) = self.bind {
                config.listener.bind_address = bind;
            }
            if !self.backends.is_empty() {
                config.backends = self.backends;
            }
            if !self.weights.is_empty() {
                config.weights = Some(self.weights);
            }
            if let Some(strategy) = self.strategy {
                config.strategy = strategy;
            }
            if let Some(secs) = self.health_interval {
                config.health_check.interval_secs = secs;
            }
            if let Some(secs) = self.probe_timeout {
                config.health_check.timeout_secs = secs;
            }
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    init_logging(&config.observability.log_level);

    tracing::info!("pool-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        strategy = %config.strategy,
        health_interval_secs = config.health_check.interval_secs,
        probe_timeout_secs = config.health_check.timeout_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
