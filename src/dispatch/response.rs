//! Handler results.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

use crate::dispatch::error::DispatchError;
use crate::dispatch::media::MediaType;

/// Response body before serialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Json(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl Entity {
    /// Media type used when neither the handler nor negotiation picked one.
    pub fn default_media_type(&self) -> MediaType {
        match self {
            Self::Json(_) => MediaType::application_json(),
            Self::Text(_) => MediaType::text_plain_utf8(),
            Self::Bytes(_) => MediaType::application_octet_stream(),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, DispatchError> {
        match self {
            Self::Json(value) => Ok(serde_json::to_vec(&value)?),
            Self::Text(text) => Ok(text.into_bytes()),
            Self::Bytes(bytes) => Ok(bytes),
        }
    }
}

/// What a resource method returns.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    entity: Option<Entity>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            entity: None,
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// `201 Created` with a `Location` header.
    pub fn created(location: &str) -> Result<Self, DispatchError> {
        let value = HeaderValue::from_str(location)
            .map_err(|e| DispatchError::Internal(format!("invalid location {location:?}: {e}")))?;
        Ok(Self::new(StatusCode::CREATED).header(header::LOCATION, value))
    }

    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, DispatchError> {
        self.entity = Some(Entity::Json(serde_json::to_value(value)?));
        Ok(self)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.entity = Some(Entity::Text(text.into()));
        self
    }

    pub fn bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.entity = Some(Entity::Bytes(bytes.into()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn entity(&self) -> Option<&Entity> {
        self.entity.as_ref()
    }

    pub fn take_entity(&mut self) -> Option<Entity> {
        self.entity.take()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Option<Entity>) {
        (self.status, self.headers, self.entity)
    }
}
