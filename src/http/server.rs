//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler and the metrics endpoint
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Dispatch requests to the backend pool
//! - Forward requests to upstream backends and stream responses back
//! - Run the health monitor alongside the server

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, Version},
    response::Response,
    routing::{any, get},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{BalancerConfig, ConfigError};
use crate::health::HealthMonitor;
use crate::http::error::ProxyError;
use crate::http::request::{append_forwarded_for, strip_hop_by_hop, X_REQUEST_ID};
use crate::http::response::GuardedBody;
use crate::load_balancer::BackendPool;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<BackendPool>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: BalancerConfig,
    pool: Arc<BackendPool>,
}

impl HttpServer {
    /// Create a server with a fresh pool built from the configuration.
    pub fn new(config: BalancerConfig) -> Result<Self, ConfigError> {
        let pool = Arc::new(BackendPool::from_config(&config)?);
        Ok(Self::with_pool(config, pool, None))
    }

    /// Create a server over an existing pool, optionally exposing metrics.
    pub fn with_pool(
        config: BalancerConfig,
        pool: Arc<BackendPool>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Self {
        let mut connector = HttpConnector::new();
        if config.timeouts.connect_secs > 0 {
            connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        }
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            pool: pool.clone(),
            client,
        };

        let router = Self::build_router(&config, state, metrics_handle);
        Self {
            router,
            config,
            pool,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &BalancerConfig,
        state: AppState,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Router {
        let mut router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler));

        if let Some(handle) = metrics_handle {
            router = router.route(
                &config.observability.metrics_path,
                get(move || std::future::ready(handle.render())),
            );
        }

        router.with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// Run the server, accepting connections on the given listener, until the
    /// shutdown signal fires. The health monitor runs for the same lifetime.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            strategy = %self.pool.strategy(),
            backends = self.pool.backends().len(),
            "HTTP server starting"
        );

        // returns at once when health checks are disabled
        let monitor = HealthMonitor::new(self.pool.clone(), self.config.health_check.clone());
        tokio::spawn(monitor.run(shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The pool this server dispatches to.
    pub fn pool(&self) -> Arc<BackendPool> {
        self.pool.clone()
    }
}

/// Main proxy handler.
/// Selects a backend, forwards the request and streams the response back.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let Some(guard) = state.pool.select() else {
        tracing::warn!(
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
            "No healthy backends"
        );
        metrics::record_unavailable();
        return Err(ProxyError::NoHealthyBackend);
    };

    let (mut parts, body) = request.into_parts();
    parts.uri = guard.upstream_uri(parts.uri.path_and_query())?;
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);
    append_forwarded_for(&mut parts.headers, client_addr.ip());

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        upstream = %parts.uri,
        "Proxying request"
    );

    // On error the guard is dropped here; liveness is left to the prober.
    let response = state
        .client
        .request(Request::from_parts(parts, body))
        .await
        .map_err(|e| {
            tracing::error!(request_id = %request_id, backend = %guard.label, error = %e, "Upstream error");
            ProxyError::Upstream(e)
        })?;

    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Ok(Response::from_parts(parts, Body::new(GuardedBody::new(body, guard))))
}
