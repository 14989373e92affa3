//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a catch-all dispatch handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind the server to a listener and shut down gracefully
//! - Record per-request metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    response::IntoResponse,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::DispatcherConfig;
use crate::dispatch::Dispatcher;
use crate::http::request::{read_context, UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::resource::ResourceRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_entity_bytes: usize,
}

/// HTTP front end of the dispatcher.
pub struct HttpServer {
    router: Router,
    config: DispatcherConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving the resources in `registry`.
    pub fn new(config: DispatcherConfig, registry: Arc<ResourceRegistry>) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(registry, config.dispatch.clone()));
        let state = AppState {
            dispatcher,
            max_entity_bytes: config.dispatch.max_entity_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DispatcherConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for serving through other means.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Builds the request context, dispatches it and converts the outcome.
async fn dispatch_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> axum::response::Response {
    let start = Instant::now();
    let method = request.method().clone();

    let outcome = match read_context(request, state.max_entity_bytes).await {
        Ok(mut ctx) => state.dispatcher.dispatch(&mut ctx),
        Err(e) => Err(e),
    };

    let mut response = match outcome {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::debug!(status = %e.status(), error = %e, "Request not dispatched");
            e.into_response()
        }
    };
    if method == Method::HEAD {
        *response.body_mut() = Body::empty();
    }

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}
