//! Dispatch outcomes that end a request without reaching a handler, or that a
//! handler reports back.

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::dispatch::media::MediaTypeError;
use crate::uri::BuildError;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// No resource, sub-resource or locator result for the path.
    #[error("no resource matches {path}")]
    NotFound { path: String },

    #[error("method {method} not allowed")]
    MethodNotAllowed { method: Method, allow: Vec<Method> },

    #[error("unsupported media type {0}")]
    UnsupportedMediaType(String),

    #[error("no acceptable representation")]
    NotAcceptable,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("malformed media type: {0}")]
    MediaType(#[from] MediaTypeError),

    #[error("invalid entity: {0}")]
    Entity(#[from] serde_json::Error),

    #[error("request entity larger than {limit} bytes")]
    EntityTooLarge { limit: usize },

    #[error("failed to build URI: {0}")]
    Build(#[from] BuildError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::BadRequest(_) | Self::MediaType(_) | Self::Entity(_) => StatusCode::BAD_REQUEST,
            Self::EntityTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Build(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(DispatchError::not_found("/x").status(), StatusCode::NOT_FOUND);
        assert_eq!(DispatchError::NotAcceptable.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(
            DispatchError::Build(BuildError::MissingValue("id".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let err = DispatchError::MethodNotAllowed {
            method: Method::DELETE,
            allow: vec![Method::GET],
        };
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.to_string(), "method DELETE not allowed");
    }
}
