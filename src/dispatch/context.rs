//! Per-request state handed to handlers and locators.

use axum::http::{header, HeaderMap, Method};
use serde::de::DeserializeOwned;

use crate::dispatch::error::DispatchError;
use crate::dispatch::media::MediaType;

/// Path parameters bound while descending through resources.
///
/// A name bound again by a deeper resource shadows the outer binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParameters {
    entries: Vec<(String, String)>,
}

impl PathParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// The innermost value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value bound to `name`, outermost first.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses a raw query string as `application/x-www-form-urlencoded`.
///
/// Invalid UTF-8 in a decoded escape is replaced with U+FFFD.
pub fn parse_query(raw: &str) -> Result<Vec<(String, String)>, DispatchError> {
    serde_urlencoded::from_str(raw)
        .map_err(|e| DispatchError::BadRequest(format!("malformed query string: {e}")))
}

/// Everything a handler or locator may read about the current request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Vec<u8>,
    path_params: PathParameters,
    request_id: Option<String>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            path_params: PathParameters::new(),
            request_id: None,
        }
    }

    /// Sets query parameters from a raw (still encoded) query string.
    pub fn with_query(mut self, raw: Option<&str>) -> Result<Self, DispatchError> {
        self.query = match raw {
            Some(raw) => parse_query(raw)?,
            None => Vec::new(),
        };
        Ok(self)
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    pub fn path_params(&self) -> &PathParameters {
        &self.path_params
    }

    pub(crate) fn path_params_mut(&mut self) -> &mut PathParameters {
        &mut self.path_params
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn query_params(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Path parameter parsed into `T`; a missing or malformed value is a bad
    /// request.
    pub fn parse_path_param<T: std::str::FromStr>(&self, name: &str) -> Result<T, DispatchError> {
        let raw = self
            .path_param(name)
            .ok_or_else(|| DispatchError::BadRequest(format!("missing path parameter {name}")))?;
        raw.parse()
            .map_err(|_| DispatchError::BadRequest(format!("invalid path parameter {name}: {raw}")))
    }

    pub fn content_type(&self) -> Result<Option<MediaType>, DispatchError> {
        self.header(header::CONTENT_TYPE.as_str())
            .map(|value| value.parse().map_err(DispatchError::from))
            .transpose()
    }

    /// Decodes the JSON request entity.
    pub fn entity<T: DeserializeOwned>(&self) -> Result<T, DispatchError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[test]
    fn test_query_decoding() {
        let ctx = RequestContext::new(Method::GET, "/search")
            .with_query(Some("q=rust+lang&tag=a%26b&tag=c&flag"))
            .unwrap();
        assert_eq!(ctx.query_param("q"), Some("rust lang"));
        assert_eq!(ctx.query_params("tag"), ["a&b", "c"]);
        assert_eq!(ctx.query_param("flag"), Some(""));
        assert_eq!(ctx.query_param("missing"), None);
    }

    #[test]
    fn test_query_edge_cases() {
        assert_eq!(parse_query("").unwrap(), Vec::<(String, String)>::new());
        assert_eq!(
            parse_query("&&a=1&=x&b=%FF").unwrap(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("".to_string(), "x".to_string()),
                ("b".to_string(), "\u{FFFD}".to_string()),
            ]
        );
        assert_eq!(
            parse_query("name=J%C3%BCrgen%20M&x=a=b").unwrap(),
            vec![
                ("name".to_string(), "Jürgen M".to_string()),
                ("x".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn test_path_params_shadowing() {
        let mut params = PathParameters::new();
        params.push("id", "1");
        params.push("page", "2");
        params.push("id", "3");
        assert_eq!(params.get("id"), Some("3"));
        assert_eq!(params.get_all("id"), ["1", "3"]);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_entity() {
        #[derive(Deserialize)]
        struct Book {
            title: String,
        }
        let ctx = RequestContext::new(Method::POST, "/books").with_body(r#"{"title":"Dune"}"#);
        let book: Book = ctx.entity().unwrap();
        assert_eq!(book.title, "Dune");

        let bad = RequestContext::new(Method::POST, "/books").with_body("{");
        assert!(matches!(bad.entity::<Book>(), Err(DispatchError::Entity(_))));
    }

    #[test]
    fn test_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let ctx = RequestContext::new(Method::POST, "/").with_headers(headers);
        assert_eq!(ctx.content_type().unwrap(), Some(MediaType::application_json()));
        assert_eq!(RequestContext::new(Method::GET, "/").content_type().unwrap(), None);
    }
}
