//! Request handling.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID when the client sent none
//! - Read the request body up to the configured limit
//! - Turn an HTTP request into a `RequestContext`
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The query string is decoded once, here

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use http_body_util::LengthLimitError;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::dispatch::{DispatchError, RequestContext};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Buffers the body (at most `limit` bytes) and builds the dispatch context.
pub async fn read_context(request: Request<Body>, limit: usize) -> Result<RequestContext, DispatchError> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| {
            if is_length_limit(&e) {
                DispatchError::EntityTooLarge { limit }
            } else {
                DispatchError::BadRequest(format!("failed to read request entity: {e}"))
            }
        })?;

    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut ctx = RequestContext::new(parts.method, parts.uri.path())
        .with_query(parts.uri.query())?
        .with_headers(parts.headers)
        .with_body(body.to_vec());
    if let Some(id) = request_id {
        ctx = ctx.with_request_id(id);
    }
    Ok(ctx)
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[tokio::test]
    async fn test_read_context() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/books/1?fields=title%2Cauthor")
            .header(X_REQUEST_ID, "abc")
            .body(Body::from("{}"))
            .unwrap();
        let ctx = read_context(request, 16).await.unwrap();
        assert_eq!(ctx.method(), Method::POST);
        assert_eq!(ctx.path(), "/books/1");
        assert_eq!(ctx.query_param("fields"), Some("title,author"));
        assert_eq!(ctx.request_id(), Some("abc"));
        assert_eq!(ctx.body(), b"{}");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::from(vec![b'x'; 32]))
            .unwrap();
        let err = read_context(request, 16).await.unwrap_err();
        assert!(matches!(err, DispatchError::EntityTooLarge { limit: 16 }));
    }

    #[tokio::test]
    async fn test_broken_body_is_bad_request() {
        let chunks: Vec<Result<axum::body::Bytes, std::io::Error>> = vec![
            Ok(axum::body::Bytes::from_static(b"ab")),
            Err(std::io::Error::other("connection reset")),
        ];
        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();
        let err = read_context(request, 16).await.unwrap_err();
        assert!(matches!(err, DispatchError::BadRequest(_)), "got {err:?}");
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let request = Request::new(());
        let mut make = UuidRequestId;
        let a = make.make_request_id(&request).unwrap();
        let b = make.make_request_id(&request).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
