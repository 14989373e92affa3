//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rest_dispatcher::config::DispatcherConfig;
use rest_dispatcher::dispatch::{DispatchError, MediaType, RequestContext, Response};
use rest_dispatcher::resource::{Resource, ResourceMethod, ResourceRegistry};
use rest_dispatcher::{HttpServer, Shutdown};
use axum::http::Method;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A dispatcher server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Triggers shutdown and waits for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
            .expect("server failed");
    }
}

pub async fn start_server(config: DispatcherConfig, registry: ResourceRegistry) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, Arc::new(registry));
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    TestServer {
        addr,
        shutdown,
        handle,
    }
}

pub fn text(body: &'static str) -> impl Fn(&RequestContext) -> Result<Response, DispatchError> {
    move |_: &RequestContext| -> Result<Response, DispatchError> { Ok(Response::ok().text(body)) }
}

/// Echoes the bound path parameters as `name=value` lines.
pub fn echo_params(ctx: &RequestContext) -> Result<Response, DispatchError> {
    let lines: Vec<String> = ctx
        .path_params()
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    Ok(Response::ok().text(lines.join("\n")))
}

/// A small library: authors with nested books reached through a locator.
pub fn library() -> ResourceRegistry {
    let book = Resource::sub_resource("book")
        .get(echo_params)
        .build_shared()
        .unwrap();
    let books = Resource::sub_resource("books")
        .get(text("books"))
        .sub_resource_locator("{book}", move |_: &RequestContext| -> Option<Arc<Resource>> {
            Some(book.clone())
        })
        .build_shared()
        .unwrap();

    ResourceRegistry::with_resources([
        Resource::builder("authors", "/authors")
            .get(text("authors"))
            .sub_resource_method("new", ResourceMethod::new(Method::GET, text("new author form")))
            .sub_resource_method("{author}", ResourceMethod::new(Method::GET, echo_params))
            .sub_resource_locator("{author}/books", move |ctx: &RequestContext| -> Option<Arc<Resource>> {
                (ctx.path_param("author") != Some("nobody")).then(|| books.clone())
            })
            .build()
            .unwrap(),
        Resource::builder("echo", "/echo")
            .method(
                ResourceMethod::new(Method::POST, |ctx: &RequestContext| -> Result<Response, DispatchError> {
                    let value: serde_json::Value = ctx.entity()?;
                    Response::ok().json(&value)
                })
                .consumes(MediaType::application_json())
                .produces(MediaType::application_json()),
            )
            .build()
            .unwrap(),
    ])
    .unwrap()
}
