//! Smooth weighted round-robin load balancing strategy.
//!
//! Every call adds each alive backend's weight to its `current_weight`, picks the
//! highest accumulator and subtracts the total alive weight from it. Over a full
//! cycle each backend is picked `weight` times, spread out instead of in blocks.

use std::sync::Arc;

use crate::load_balancer::{Backend, BackendStatus, LoadBalancer};

/// Smooth weighted round-robin selector.
/// The accumulators live in the pool's status slots, so this type is stateless.
#[derive(Debug, Default)]
pub struct SmoothWeighted;

impl SmoothWeighted {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for SmoothWeighted {
    fn next_server(&mut self, backends: &[Arc<Backend>], status: &mut [BackendStatus]) -> Option<usize> {
        let mut total: i64 = 0;
        let mut best: Option<(usize, i64)> = None;

        for (index, (backend, slot)) in backends.iter().zip(status.iter_mut()).enumerate() {
            if !slot.alive {
                continue;
            }
            let weight = i64::from(backend.weight);
            slot.current_weight += weight;
            total += weight;

            // strict: ties keep the earlier backend
            if best.map_or(true, |(_, max)| slot.current_weight > max) {
                best = Some((index, slot.current_weight));
            }
        }

        let (index, _) = best?;
        status[index].current_weight -= total;
        Some(index)
    }
}
