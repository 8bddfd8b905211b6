//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → pool.rs (take the pool guard)
//!     → Apply the configured strategy:
//!         - round_robin.rs (rotate through alive backends)
//!         - least_conn.rs (pick alive backend with fewest in-flight requests)
//!         - weighted.rs (smooth weighted round-robin)
//!     → increment active connections, release the guard
//!     → backend.rs (connection guard travels with the response body)
//! ```
//!
//! # Design Decisions
//! - One pool-wide mutex covers liveness, connection counts and weight state, so a
//!   selection and its increment are a single critical section
//! - Strategies never see the lock; they get `&mut` access to the status slots
//! - The strategy is fixed at construction and owns its own cursor state
//! - Dead backends are never returned

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod backend;
pub mod least_conn;
pub mod pool;
pub mod round_robin;
pub mod weighted;

pub use backend::{Backend, BackendConnectionGuard, BackendStatus};
pub use pool::{BackendPool, BackendSnapshot};

/// A backend selection algorithm.
///
/// Called with the pool guard held. Returns the index of the chosen backend, or
/// `None` when no backend is alive.
pub trait LoadBalancer: Send + Sync + fmt::Debug {
    fn next_server(&mut self, backends: &[Arc<Backend>], status: &mut [BackendStatus]) -> Option<usize>;
}

/// Which selection algorithm a pool uses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    RoundRobin,
    LeastConnections,
    WeightedRoundRobin,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RoundRobin => "round_robin",
            Strategy::LeastConnections => "least_connections",
            Strategy::WeightedRoundRobin => "weighted_round_robin",
        }
    }

    /// Instantiate the algorithm with fresh state.
    pub fn build(self) -> Box<dyn LoadBalancer> {
        match self {
            Strategy::RoundRobin => Box::new(round_robin::RoundRobin::new()),
            Strategy::LeastConnections => Box::new(least_conn::LeastConnections::new()),
            Strategy::WeightedRoundRobin => Box::new(weighted::SmoothWeighted::new()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
