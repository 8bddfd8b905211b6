//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → load balancer picks a backend (guard taken)
//!     → request.rs (rewrite URI, strip hop-by-hop headers, X-Forwarded-For)
//!     → hyper client → backend
//!     → response.rs (stream body back, guard released at end of body)
//!     → error.rs (503 / 502 mapping)
//! ```

pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use request::{X_FORWARDED_FOR, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
