//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext (method, path, query, headers, body)
//!     → resource::resolver (resource + candidate methods, path params bound)
//!     → dispatcher.rs (filter by HTTP method, Content-Type, Accept)
//!     → handler
//!     → Response (status, headers, entity)
//! ```
//!
//! # Design Decisions
//! - Dispatch is synchronous; the HTTP adapter owns all I/O
//! - Every failure is a `DispatchError` carrying its HTTP status
//! - Negotiation picks the highest client quality, then the most specific
//!   produced type, then declaration order

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod media;
pub mod response;

pub use context::{parse_query, PathParameters, RequestContext};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use media::{parse_accept, MediaType, MediaTypeError};
pub use response::{Entity, Response};
