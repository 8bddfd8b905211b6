//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend with `GET <address><path>`
//! - Mark a backend alive iff the probe returns exactly 200 in time
//! - Log failures and liveness transitions

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::load_balancer::{Backend, BackendPool};
use crate::observability::metrics;

/// Why a probe did not count as healthy.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("invalid probe request: {0}")]
    Request(String),
}

pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());

        Self { pool, config, client }
    }

    /// Probe forever, one cycle per interval, until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            path = %self.config.path,
            backends = self.pool.backends().len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        // a slow cycle delays the next one instead of bunching ticks
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one probing cycle. Every backend is probed concurrently and every
    /// result is applied before this returns.
    pub async fn check_all(&self) {
        let probes = self.pool.backends().iter().map(|backend| self.probe(backend));
        let results = join_all(probes).await;

        for (index, (backend, result)) in self.pool.backends().iter().zip(results).enumerate() {
            let alive = match result {
                Ok(()) => true,
                Err(failure) => {
                    tracing::warn!(backend = %backend.label, reason = %failure, "Backend is down");
                    false
                }
            };

            if self.pool.set_alive(index, alive) {
                if alive {
                    tracing::info!(backend = %backend.label, "Backend is back up");
                } else {
                    tracing::warn!(backend = %backend.label, "Backend removed from rotation");
                }
            }

            metrics::record_backend_health(&backend.label, alive);
        }
    }

    /// Probe a single backend.
    pub async fn probe(&self, backend: &Backend) -> Result<(), ProbeFailure> {
        let uri = backend
            .probe_uri(&self.config.path)
            .map_err(|e| ProbeFailure::Request(e.to_string()))?;

        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("user-agent", "pool-proxy-health-check")
            .body(Body::empty())
            .map_err(|e| ProbeFailure::Request(e.to_string()))?;

        let timeout = Duration::from_secs(self.config.timeout_secs);
        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status() == StatusCode::OK => Ok(()),
            Ok(Ok(response)) => Err(ProbeFailure::Status(response.status())),
            Ok(Err(e)) => Err(ProbeFailure::Transport(e.to_string())),
            Err(_) => Err(ProbeFailure::Timeout(timeout)),
        }
    }
}
