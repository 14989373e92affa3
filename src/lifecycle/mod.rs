//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every subscriber wakes → server stops accepting → drain
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the shutdown out to every task
//! - In-flight requests finish before the server returns

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
