//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server (immutable identity and weight)
//! - Hold the mutable per-backend record guarded by the pool
//! - Build upstream and probe URIs from the configured base address
//! - Release the active-connection count exactly once via a RAII guard

use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;

use axum::http::uri::{InvalidUri, PathAndQuery};
use axum::http::Uri;
use url::Url;

use crate::load_balancer::pool::BackendPool;

/// Mutable runtime state of one backend. Only ever touched under the pool guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendStatus {
    /// Result of the latest health probe.
    pub alive: bool,
    /// Requests currently in flight to this backend.
    pub active_connections: usize,
    /// Smooth weighted round-robin accumulator.
    pub current_weight: i64,
}

impl Default for BackendStatus {
    fn default() -> Self {
        Self {
            alive: true,
            active_connections: 0,
            current_weight: 0,
        }
    }
}

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// The configured base address.
    pub address: Url,
    /// Address without a trailing slash, used as the metrics and log label.
    pub label: String,
    /// Relative traffic share for the weighted strategy (>= 1).
    pub weight: u32,
    /// Pre-calculated `host[:port]` for URI rewriting.
    authority: String,
}

impl Backend {
    /// Create a new backend.
    pub fn new(address: Url, weight: u32) -> Self {
        let host = address.host_str().unwrap_or_default();
        let authority = match address.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let label = address.as_str().trim_end_matches('/').to_string();

        Self {
            address,
            label,
            weight,
            authority,
        }
    }

    /// URI for forwarding a request with the given path and query.
    pub fn upstream_uri(&self, path_and_query: Option<&PathAndQuery>) -> Result<Uri, InvalidUri> {
        let (path, query) = match path_and_query {
            Some(pq) => (pq.path(), pq.query()),
            None => ("/", None),
        };

        let mut target = format!(
            "{}://{}{}",
            self.address.scheme(),
            self.authority,
            join_path(self.address.path(), path)
        );
        if let Some(query) = query {
            target.push('?');
            target.push_str(query);
        }
        target.parse()
    }

    /// URI for health probing.
    pub fn probe_uri(&self, path: &str) -> Result<Uri, InvalidUri> {
        format!(
            "{}://{}{}",
            self.address.scheme(),
            self.authority,
            join_path(self.address.path(), path)
        )
        .parse()
    }
}

/// Join a base path and a request path with exactly one slash between them.
fn join_path(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// A RAII guard that owns one unit of a backend's active connection count.
///
/// Created by [`BackendPool::select`]. Dropping it decrements the count and
/// records the request duration, whichever path the request took.
#[derive(Debug)]
pub struct BackendConnectionGuard {
    pool: Arc<BackendPool>,
    backend: Arc<Backend>,
    index: usize,
    started: Instant,
}

impl BackendConnectionGuard {
    pub(crate) fn new(pool: Arc<BackendPool>, backend: Arc<Backend>, index: usize) -> Self {
        Self {
            pool,
            backend,
            index,
            started: Instant::now(),
        }
    }

    /// Position of the backend in the pool.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Deref for BackendConnectionGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for BackendConnectionGuard {
    fn drop(&mut self) {
        self.pool.release(self.index, self.started.elapsed());
    }
}
