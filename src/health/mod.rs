//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each backend (concurrently, bounded timeout)
//!     → pool.set_alive() for every backend
//!     → next cycle only after all results are applied
//! ```
//!
//! # Design Decisions
//! - Liveness is written only here; proxy failures never mark a backend dead
//! - One probe result flips the state, no thresholds
//! - Probing never holds the pool lock across network I/O

pub mod active;

pub use active::{HealthMonitor, ProbeFailure};
