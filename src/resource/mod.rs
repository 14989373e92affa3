//! Resource model and resolution.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     ResourceBuilder
//!     → descriptor.rs (compile templates, reject duplicate methods)
//!     → registry.rs (reject duplicate root patterns, publish snapshot)
//!
//! Per request:
//!     path → resolver.rs (best root resource)
//!          → remainder → sub-resource methods / locators
//!          → locator result → repeat with the new remainder
//!          → Target (resource + candidate methods)
//! ```
//!
//! # Design Decisions
//! - Resources are immutable once built and shared through `Arc`
//! - Resolution reads one snapshot for its whole duration

pub mod descriptor;
pub mod registry;
pub mod resolver;

pub use descriptor::{
    Handler, Locator, Resource, ResourceBuilder, ResourceError, ResourceMethod,
    SubResourceLocator, SubResourceMethod,
};
pub use registry::{RegistryError, ResourceRegistry, Snapshot};
pub use resolver::{ResourceResolver, Target};
