//! URI template subsystem.
//!
//! # Data Flow
//! ```text
//! Resource registration:
//!     "/books/{id}"
//!     → template.rs (scan, escape literals, build regex + group layout)
//!     → pattern.rs (compiled regex, ranking order)
//!
//! Request time:
//!     "/books/42/reviews"
//!     → pattern.rs match → ["42", "/reviews"]
//!
//! Response building:
//!     template + values
//!     → builder.rs (substitute, encode or validate per component)
//!     → component.rs (character classes)
//! ```
//!
//! # Design Decisions
//! - Templates compile once; patterns are immutable and shared
//! - Pattern identity is the regex string, not the variable names
//! - Ranking: literal characters, then variable count, then regex text

pub mod builder;
pub mod component;
pub mod error;
pub mod pattern;
pub mod template;

pub use builder::{create_uri_with_map, create_uri_with_values, UriBuilder, UriParts};
pub use component::UriComponent;
pub use error::{BuildError, TemplateError};
pub use pattern::{is_terminal, UriMatch, UriPattern};
pub use template::{compile, CompiledTemplate};
