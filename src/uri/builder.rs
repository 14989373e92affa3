//! URI construction from templates.
//!
//! # Responsibilities
//! - Substitute `{name}` placeholders in every URI component
//! - Bind values by name (map) or by first-occurrence position (slice)
//! - Encode values, or validate them when the caller supplies encoded text
//! - Keep unresolved placeholders verbatim in as-template mode
//!
//! All occurrences of one parameter get the value bound to its first
//! occurrence: `{a}/{b}/{a}` with `["x", "y", "z"]` builds `x/y/x`.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use crate::uri::component::{self, UriComponent};
use crate::uri::error::BuildError;
use crate::uri::template::{find_close, split_variable};

/// The components of a URI, each of which may hold placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
    pub scheme: Option<String>,
    pub user_info: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

/// Source of placeholder values. Returned values are already encoded or
/// validated for `component`.
trait ValueSource {
    fn resolve(
        &mut self,
        name: &str,
        component: UriComponent,
        encode: bool,
    ) -> Result<Option<String>, BuildError>;
}

struct NamedValues<'a, K, V>(&'a HashMap<K, V>);

impl<K, V> ValueSource for NamedValues<'_, K, V>
where
    K: Borrow<str> + Hash + Eq,
    V: Display,
{
    fn resolve(
        &mut self,
        name: &str,
        component: UriComponent,
        encode: bool,
    ) -> Result<Option<String>, BuildError> {
        self.0
            .get(name)
            .map(|value| prepare(&value.to_string(), component, encode))
            .transpose()
    }
}

struct PositionalValues<'a, V> {
    values: &'a [V],
    offset: usize,
    bound: HashMap<String, String>,
}

impl<V: Display> ValueSource for PositionalValues<'_, V> {
    fn resolve(
        &mut self,
        name: &str,
        component: UriComponent,
        encode: bool,
    ) -> Result<Option<String>, BuildError> {
        if let Some(value) = self.bound.get(name) {
            return Ok(Some(value.clone()));
        }
        let Some(raw) = self.values.get(self.offset) else {
            return Ok(None);
        };
        self.offset += 1;
        let value = prepare(&raw.to_string(), component, encode)?;
        self.bound.insert(name.to_string(), value.clone());
        Ok(Some(value))
    }
}

fn prepare(value: &str, component: UriComponent, encode: bool) -> Result<String, BuildError> {
    if encode {
        return Ok(component::encode(value, component));
    }
    component::validate(value, component)
        .map(|()| value.to_string())
        .map_err(|character| BuildError::IllegalCharacter {
            component,
            value: value.to_string(),
            character,
        })
}

/// Builds a URI, looking placeholders up by name.
pub fn create_uri_with_map<K, V>(
    parts: &UriParts,
    values: &HashMap<K, V>,
    encode: bool,
    as_template: bool,
) -> Result<String, BuildError>
where
    K: Borrow<str> + Hash + Eq,
    V: Display,
{
    assemble(parts, &mut NamedValues(values), encode, as_template)
}

/// Builds a URI, binding values to parameters in order of first occurrence.
pub fn create_uri_with_values<V: Display>(
    parts: &UriParts,
    values: &[V],
    encode: bool,
    as_template: bool,
) -> Result<String, BuildError> {
    let mut source = PositionalValues {
        values,
        offset: 0,
        bound: HashMap::new(),
    };
    assemble(parts, &mut source, encode, as_template)
}

fn assemble(
    parts: &UriParts,
    source: &mut impl ValueSource,
    encode: bool,
    as_template: bool,
) -> Result<String, BuildError> {
    let mut uri = String::new();

    if let Some(scheme) = &parts.scheme {
        append_part(&mut uri, scheme, UriComponent::Scheme, source, false, as_template)?;
        uri.push(':');
    }

    if parts.user_info.is_some() || parts.host.is_some() || parts.port.is_some() {
        uri.push_str("//");
        if let Some(user_info) = parts.user_info.as_deref().filter(|s| !s.is_empty()) {
            append_part(&mut uri, user_info, UriComponent::UserInfo, source, encode, as_template)?;
            uri.push('@');
        }
        if let Some(host) = &parts.host {
            append_part(&mut uri, host, UriComponent::Host, source, encode, as_template)?;
        }
        if let Some(port) = &parts.port {
            uri.push(':');
            append_part(&mut uri, port, UriComponent::Port, source, encode, as_template)?;
        }
    }

    if let Some(path) = parts.path.as_deref().filter(|s| !s.is_empty()) {
        if !uri.is_empty() && !path.starts_with('/') {
            uri.push('/');
        }
        append_part(&mut uri, path, UriComponent::Path, source, encode, as_template)?;
    }

    if let Some(query) = parts.query.as_deref().filter(|s| !s.is_empty()) {
        uri.push('?');
        append_part(&mut uri, query, UriComponent::Query, source, encode, as_template)?;
    }

    if let Some(fragment) = parts.fragment.as_deref().filter(|s| !s.is_empty()) {
        uri.push('#');
        append_part(&mut uri, fragment, UriComponent::Fragment, source, encode, as_template)?;
    }

    Ok(uri)
}

fn append_part(
    uri: &mut String,
    part: &str,
    component: UriComponent,
    source: &mut impl ValueSource,
    encode: bool,
    as_template: bool,
) -> Result<(), BuildError> {
    let mut pos = 0;
    while let Some(offset) = part[pos..].find('{') {
        let open = pos + offset;
        uri.push_str(&part[pos..open]);
        let close = find_close(part, open).ok_or_else(|| BuildError::MalformedTemplate {
            part: part.to_string(),
        })?;
        let (name, _) = split_variable(&part[open + 1..close]);
        match source.resolve(name, component, encode)? {
            Some(value) => uri.push_str(&value),
            None if as_template => {
                uri.push('{');
                uri.push_str(name);
                uri.push('}');
            }
            None => return Err(BuildError::MissingValue(name.to_string())),
        }
        pos = close + 1;
    }
    uri.push_str(&part[pos..]);
    Ok(())
}

/// Fluent front end over [`UriParts`].
///
/// ```
/// use rest_dispatcher::uri::UriBuilder;
///
/// let uri = UriBuilder::from_path("/books/{id}")
///     .scheme("http")
///     .host("localhost")
///     .port(8080)
///     .build(&[42])
///     .unwrap();
/// assert_eq!(uri, "http://localhost:8080/books/42");
/// ```
#[derive(Debug, Clone)]
pub struct UriBuilder {
    parts: UriParts,
    encode: bool,
    as_template: bool,
}

impl Default for UriBuilder {
    fn default() -> Self {
        Self {
            parts: UriParts::default(),
            encode: true,
            as_template: false,
        }
    }
}

impl UriBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(path: impl Into<String>) -> Self {
        Self::new().path(path)
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.parts.scheme = Some(scheme.into());
        self
    }

    pub fn user_info(mut self, user_info: impl Into<String>) -> Self {
        self.parts.user_info = Some(user_info.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.parts.host = Some(host.into());
        self
    }

    /// Sets the port; accepts a number or a `{placeholder}`.
    pub fn port(mut self, port: impl ToString) -> Self {
        self.parts.port = Some(port.to_string());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.parts.path = Some(path.into());
        self
    }

    /// Appends a path segment, joining with exactly one `/`.
    pub fn segment(mut self, segment: &str) -> Self {
        let mut path = self.parts.path.take().unwrap_or_default();
        match (path.ends_with('/'), segment.starts_with('/')) {
            (true, true) => path.push_str(&segment[1..]),
            (false, false) => {
                path.push('/');
                path.push_str(segment);
            }
            _ => path.push_str(segment),
        }
        self.parts.path = Some(path);
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.parts.query = Some(query.into());
        self
    }

    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.parts.fragment = Some(fragment.into());
        self
    }

    /// When false, values must already be encoded and are only validated.
    pub fn encode(mut self, encode: bool) -> Self {
        self.encode = encode;
        self
    }

    /// When true, placeholders without a value are kept as `{name}`.
    pub fn as_template(mut self, as_template: bool) -> Self {
        self.as_template = as_template;
        self
    }

    pub fn parts(&self) -> &UriParts {
        &self.parts
    }

    pub fn build<V: Display>(&self, values: &[V]) -> Result<String, BuildError> {
        create_uri_with_values(&self.parts, values, self.encode, self.as_template)
    }

    pub fn build_from_map<K, V>(&self, values: &HashMap<K, V>) -> Result<String, BuildError>
    where
        K: Borrow<str> + Hash + Eq,
        V: Display,
    {
        create_uri_with_map(&self.parts, values, self.encode, self.as_template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path(p: &str) -> UriParts {
        UriParts {
            path: Some(p.to_string()),
            ..UriParts::default()
        }
    }

    const NONE: [&str; 0] = [];

    #[test]
    fn test_positional_first_occurrence_wins() {
        let uri = create_uri_with_values(&path("/{a}/{b}/{a}"), &["x", "y", "z"], true, false);
        assert_eq!(uri.unwrap(), "/x/y/x");
    }

    #[test]
    fn test_positional_binding_spans_components() {
        let parts = UriParts {
            host: Some("{h}.example.com".into()),
            path: Some("/{id}/{h}".into()),
            query: Some("ref={id}".into()),
            ..UriParts::default()
        };
        let uri = create_uri_with_values(&parts, &["api", "7"], true, false).unwrap();
        assert_eq!(uri, "//api.example.com/7/api?ref=7");
    }

    #[test]
    fn test_named_values() {
        let values = HashMap::from([("id", "42"), ("page", "3")]);
        let uri = create_uri_with_map(&path("/books/{id}/{page}/{id}"), &values, true, false);
        assert_eq!(uri.unwrap(), "/books/42/3/42");
    }

    #[test]
    fn test_missing_value() {
        let err = create_uri_with_values(&path("/{id}"), &NONE, true, false).unwrap_err();
        assert_eq!(err, BuildError::MissingValue("id".into()));

        let values: HashMap<String, String> = HashMap::new();
        let err = create_uri_with_map(&path("/{id}"), &values, true, false).unwrap_err();
        assert_eq!(err, BuildError::MissingValue("id".into()));
    }

    #[test]
    fn test_as_template_keeps_placeholder() {
        let uri = create_uri_with_values(&path("/{id}"), &NONE, true, true).unwrap();
        assert_eq!(uri, "/{id}");

        let uri = create_uri_with_values(&path("/{a}/{b: [0-9]+}"), &["x"], true, true).unwrap();
        assert_eq!(uri, "/x/{b}");
    }

    #[test]
    fn test_encode_versus_validate() {
        let uri = create_uri_with_values(&path("/q/{term}"), &["a b"], true, false).unwrap();
        assert_eq!(uri, "/q/a%20b");

        let err = create_uri_with_values(&path("/q/{term}"), &["a b"], false, false).unwrap_err();
        assert!(matches!(
            err,
            BuildError::IllegalCharacter { component: UriComponent::Path, character: ' ', .. }
        ));

        let uri = create_uri_with_values(&path("/q/{term}"), &["a%20b"], false, false).unwrap();
        assert_eq!(uri, "/q/a%20b");
    }

    #[test]
    fn test_scheme_is_never_encoded() {
        let parts = UriParts {
            scheme: Some("{s}".into()),
            host: Some("h".into()),
            ..UriParts::default()
        };
        let err = create_uri_with_values(&parts, &["ht tp"], true, false).unwrap_err();
        assert!(matches!(err, BuildError::IllegalCharacter { component: UriComponent::Scheme, .. }));
    }

    #[test]
    fn test_assembly_order() {
        let parts = UriParts {
            scheme: Some("https".into()),
            user_info: Some("user".into()),
            host: Some("example.com".into()),
            port: Some("8443".into()),
            path: Some("books".into()),
            query: Some("q={q}".into()),
            fragment: Some("top".into()),
        };
        let uri = create_uri_with_values(&parts, &["rust"], true, false).unwrap();
        assert_eq!(uri, "https://user@example.com:8443/books?q=rust#top");
    }

    #[test]
    fn test_empty_parts_omitted() {
        let parts = UriParts {
            user_info: Some(String::new()),
            host: Some("h".into()),
            query: Some(String::new()),
            fragment: Some(String::new()),
            ..UriParts::default()
        };
        assert_eq!(create_uri_with_values(&parts, &NONE, true, false).unwrap(), "//h");
    }

    #[test]
    fn test_malformed_template() {
        let err = create_uri_with_values(&path("/{id"), &["1"], true, false).unwrap_err();
        assert!(matches!(err, BuildError::MalformedTemplate { .. }));
    }

    #[test]
    fn test_builder() {
        let uri = UriBuilder::from_path("/books")
            .segment("{id}")
            .segment("/reviews/")
            .query("sort={order}")
            .build(&["9", "desc"])
            .unwrap();
        assert_eq!(uri, "/books/9/reviews/?sort=desc");

        let uri = UriBuilder::from_path("/{id}").as_template(true).build(&NONE).unwrap();
        assert_eq!(uri, "/{id}");
    }
}
