//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DispatcherConfig (validated, immutable)
//!     → handed to the HTTP server, dispatcher and observability setup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::DispatcherConfig;
pub use schema::DispatchConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
