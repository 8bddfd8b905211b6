//! Round-robin load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{Backend, BackendStatus, LoadBalancer};

/// Round-robin selector.
/// Stores a pool-wide cursor pointing at the next position to try.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: usize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&mut self, _backends: &[Arc<Backend>], status: &mut [BackendStatus]) -> Option<usize> {
        let len = status.len();
        if len == 0 {
            return None;
        }

        // At most one full wrap; the cursor only moves on success.
        for i in 0..len {
            let index = (self.cursor + i) % len;
            if status[index].alive {
                self.cursor = (index + 1) % len;
                return Some(index);
            }
        }
        None
    }
}
