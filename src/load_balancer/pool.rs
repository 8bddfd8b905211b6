//! Backend pool management.
//!
//! # Responsibilities
//! - Own the fixed, ordered set of backends
//! - Guard every backend's mutable record behind one mutex
//! - Run the configured strategy and account the selection atomically
//! - Provide connection guards for tracking

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::validation::{parse_backend_address, validate_pool};
use crate::config::{BalancerConfig, ConfigError, ValidationError};
use crate::load_balancer::{
    backend::{Backend, BackendConnectionGuard, BackendStatus},
    LoadBalancer, Strategy,
};
use crate::observability::metrics;

/// Everything the pool mutex protects.
#[derive(Debug)]
struct PoolState {
    status: Vec<BackendStatus>,
    balancer: Box<dyn LoadBalancer>,
}

/// Point-in-time copy of one backend's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendSnapshot {
    pub address: String,
    pub weight: u32,
    pub alive: bool,
    pub active_connections: usize,
    pub current_weight: i64,
}

/// The shared pool of backends and the strategy that selects among them.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
    strategy: Strategy,
    state: Mutex<PoolState>,
}

impl BackendPool {
    /// Create a pool over already-parsed backends. All start out alive.
    pub fn new(backends: Vec<Backend>, strategy: Strategy) -> Result<Self, ConfigError> {
        if backends.is_empty() {
            return Err(ConfigError::Validation(vec![ValidationError::NoBackends]));
        }
        if let Some(index) = backends.iter().position(|b| b.weight == 0) {
            return Err(ConfigError::Validation(vec![ValidationError::ZeroWeight { index }]));
        }

        let status = vec![BackendStatus::default(); backends.len()];
        Ok(Self {
            backends: backends.into_iter().map(Arc::new).collect(),
            strategy,
            state: Mutex::new(PoolState {
                status,
                balancer: strategy.build(),
            }),
        })
    }

    /// Create a pool from an address list and an optional weight list of equal length.
    pub fn from_addresses(
        addresses: &[String],
        weights: Option<&[u32]>,
        strategy: Strategy,
    ) -> Result<Self, ConfigError> {
        let errors = validate_pool(addresses, weights);
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        let mut backends = Vec::with_capacity(addresses.len());
        for (i, address) in addresses.iter().enumerate() {
            let url = parse_backend_address(address).map_err(|e| ConfigError::Validation(vec![e]))?;
            let weight = weights.map_or(1, |w| w[i]);
            backends.push(Backend::new(url, weight));
        }

        if weights.is_some() && strategy != Strategy::WeightedRoundRobin {
            tracing::warn!(strategy = %strategy, "Backend weights configured but ignored by strategy");
        }

        Self::new(backends, strategy)
    }

    /// Create the pool described by the configuration.
    pub fn from_config(config: &BalancerConfig) -> Result<Self, ConfigError> {
        Self::from_addresses(&config.backends, config.weights.as_deref(), config.strategy)
    }

    /// Select a backend and count the request against it.
    /// Returns a guard that decrements the connection count on drop, or `None`
    /// if no backend is alive.
    pub fn select(self: &Arc<Self>) -> Option<BackendConnectionGuard> {
        let index = {
            let mut state = self.state.lock();
            let PoolState { status, balancer } = &mut *state;

            let index = balancer.next_server(&self.backends, status)?;
            let slot = &mut status[index];
            slot.active_connections += 1;
            metrics::set_active_connections(&self.backends[index].label, slot.active_connections);
            index
        };

        let backend = self.backends[index].clone();
        metrics::record_selection(&backend.label);
        tracing::trace!(backend = %backend.label, strategy = %self.strategy, "Backend selected");
        Some(BackendConnectionGuard::new(self.clone(), backend, index))
    }

    /// Give back one unit of `index`'s active connection count.
    pub(crate) fn release(&self, index: usize, elapsed: Duration) {
        let label = &self.backends[index].label;
        {
            let mut state = self.state.lock();
            let slot = &mut state.status[index];
            match slot.active_connections.checked_sub(1) {
                Some(active) => slot.active_connections = active,
                None => {
                    debug_assert!(false, "connection count underflow");
                    tracing::error!(backend = %label, "Released a connection that was never acquired");
                }
            }
            metrics::set_active_connections(label, slot.active_connections);
        }
        metrics::record_completion(label, elapsed);
    }

    /// Update liveness. Returns true if the flag changed.
    pub fn set_alive(&self, index: usize, alive: bool) -> bool {
        let mut state = self.state.lock();
        let slot = &mut state.status[index];
        let changed = slot.alive != alive;
        slot.alive = alive;
        changed
    }

    pub fn is_alive(&self, index: usize) -> bool {
        self.state.lock().status[index].alive
    }

    pub fn active_connections(&self, index: usize) -> usize {
        self.state.lock().status[index].active_connections
    }

    /// Number of backends currently marked alive.
    pub fn alive_count(&self) -> usize {
        self.state.lock().status.iter().filter(|s| s.alive).count()
    }

    /// Consistent copy of every backend record, in pool order.
    pub fn snapshot(&self) -> Vec<BackendSnapshot> {
        let state = self.state.lock();
        self.backends
            .iter()
            .zip(state.status.iter())
            .map(|(b, s)| BackendSnapshot {
                address: b.label.clone(),
                weight: b.weight,
                alive: s.alive,
                active_connections: s.active_connections,
                current_weight: s.current_weight,
            })
            .collect()
    }

    /// The backends in pool order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}
