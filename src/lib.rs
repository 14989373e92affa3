//! REST resource dispatcher: URI templates, resource resolution with
//! sub-resource locators, and content negotiation behind an Axum front end.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resource;
pub mod uri;

pub use config::schema::DispatcherConfig;
pub use dispatch::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resource::{Resource, ResourceRegistry};
