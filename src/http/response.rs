//! Response conversion.
//!
//! # Responsibilities
//! - Serialize a handler `Response` into an HTTP response
//! - Map `DispatchError` to its status with a plain-text body
//!
//! # Design Decisions
//! - 405 responses always carry `Allow`
//! - An entity that fails to serialize becomes a 500

use axum::body::Body;
use axum::http::{header, HeaderValue};
use axum::response::IntoResponse;

use crate::dispatch::dispatcher::join_methods;
use crate::dispatch::{DispatchError, Response};

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let (status, headers, entity) = self.into_parts();
        let body = match entity.map(|e| e.into_bytes()).transpose() {
            Ok(body) => body.unwrap_or_default(),
            Err(e) => return e.into_response(),
        };

        let mut response = axum::response::Response::new(Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let allow = match &self {
            DispatchError::MethodNotAllowed { allow, .. } => {
                HeaderValue::from_str(&join_methods(allow)).ok()
            }
            _ => None,
        };

        let mut response = (status, self.to_string()).into_response();
        if let Some(allow) = allow {
            response.headers_mut().insert(header::ALLOW, allow);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_response_conversion() {
        let response = Response::created("/books/1")
            .unwrap()
            .json(&serde_json::json!({"id": 1}))
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/books/1");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#"{"id":1}"#);
    }

    #[test]
    fn test_method_not_allowed_has_allow() {
        let response = DispatchError::MethodNotAllowed {
            method: Method::PUT,
            allow: vec![Method::GET, Method::HEAD],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
    }
}
