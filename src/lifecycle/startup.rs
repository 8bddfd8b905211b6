//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the backend pool from validated configuration
//! - Install the metrics recorder
//! - Bind listeners, then start the server, health monitor and admin API
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::admin::{self, AdminState};
use crate::config::BalancerConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::load_balancer::BackendPool;
use crate::observability::metrics;

/// Run the balancer until SIGINT/SIGTERM.
pub async fn run(config: BalancerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = Arc::new(BackendPool::from_config(&config)?);
    tracing::info!(
        strategy = %pool.strategy(),
        backends = ?config.backends,
        weights = ?config.weights,
        "Backend pool created"
    );

    let metrics_handle = if config.observability.metrics_enabled {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            signals::wait_for_signal().await;
            shutdown.trigger();
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState {
            pool: pool.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(admin_listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let server = HttpServer::with_pool(config, pool, metrics_handle);
    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}
