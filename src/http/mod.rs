//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request ID, trace, timeout)
//!     → request.rs (read body up to the limit, build RequestContext)
//!     → dispatch::Dispatcher (resolve resource, select method, invoke)
//!     → response.rs (status, headers, entity → HTTP response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{read_context, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
