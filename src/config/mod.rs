//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI / environment overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//!     → shared by value with the subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend set never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::AdminConfig;
pub use schema::BalancerConfig;
pub use schema::HealthCheckConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use validation::ValidationError;
