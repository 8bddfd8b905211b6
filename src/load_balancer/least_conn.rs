//! Least Connections load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{Backend, BackendStatus, LoadBalancer};

/// Least connections selector.
/// Selects the alive backend with the minimum number of in-flight requests.
///
/// Ties are broken in pool order starting just after the previous pick, so
/// equally loaded backends take turns instead of piling onto the lowest index.
#[derive(Debug, Default)]
pub struct LeastConnections {
    last: Option<usize>,
}

impl LeastConnections {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for LeastConnections {
    fn next_server(&mut self, _backends: &[Arc<Backend>], status: &mut [BackendStatus]) -> Option<usize> {
        let n = status.len();
        let start = self.last.map_or(0, |last| (last + 1) % n);

        // min_by_key keeps the first minimum, and iteration starts at the cursor
        let picked = (0..n)
            .map(|offset| (start + offset) % n)
            .filter(|&index| status[index].alive)
            .min_by_key(|&index| status[index].active_connections)?;

        self.last = Some(picked);
        Some(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::test_support::{alive, backends};

    #[test]
    fn test_least_conn() {
        let mut lb = LeastConnections::new();
        let backends = backends(&[1, 1, 1]);
        let mut status = alive(3);
        status[0].active_connections = 2;
        status[2].active_connections = 1;

        let first = lb.next_server(&backends, &mut status).unwrap();
        assert_eq!(first, 1);

        // no completions in between
        status[first].active_connections += 1;

        let second = lb.next_server(&backends, &mut status).unwrap();
        assert_eq!(second, 2);
    }

    #[test]
    fn test_first_tie_goes_to_pool_order() {
        let mut lb = LeastConnections::new();
        let backends = backends(&[1, 1, 1]);
        let mut status = alive(3);

        assert_eq!(lb.next_server(&backends, &mut status), Some(0));
    }

    #[test]
    fn test_ties_rotate_after_previous_pick() {
        let mut lb = LeastConnections::new();
        let backends = backends(&[1, 1, 1]);
        let mut status = alive(3);
        status[0].active_connections = 4;

        // counts never change, so only the tie rule decides
        let order: Vec<usize> = (0..4)
            .map(|_| lb.next_server(&backends, &mut status).unwrap())
            .collect();
        assert_eq!(order, [1, 2, 1, 2]);
    }

    #[test]
    fn test_rotation_skips_dead_backends() {
        let mut lb = LeastConnections::new();
        let backends = backends(&[1, 1, 1]);
        let mut status = alive(3);

        assert_eq!(lb.next_server(&backends, &mut status), Some(0));
        status[1].alive = false;
        assert_eq!(lb.next_server(&backends, &mut status), Some(2));
        assert_eq!(lb.next_server(&backends, &mut status), Some(0));
    }

    #[test]
    fn test_idle_dead_backend_is_ignored() {
        let mut lb = LeastConnections::new();
        let backends = backends(&[1, 1]);
        let mut status = alive(2);
        status[0].alive = false;
        status[1].active_connections = 10;

        assert_eq!(lb.next_server(&backends, &mut status), Some(1));
    }
}
