//! Media types and content negotiation helpers.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use mime::Mime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaTypeError {
    #[error("empty media type")]
    Empty,
    #[error("invalid media type {value:?}: {source}")]
    Invalid {
        value: String,
        #[source]
        source: mime::FromStrError,
    },
}

/// A `type/subtype` pair with optional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType(Mime);

impl MediaType {
    pub fn wildcard() -> Self {
        Self(mime::STAR_STAR)
    }

    pub fn application_json() -> Self {
        Self(mime::APPLICATION_JSON)
    }

    pub fn text_plain() -> Self {
        Self(mime::TEXT_PLAIN)
    }

    pub fn text_plain_utf8() -> Self {
        Self(mime::TEXT_PLAIN_UTF_8)
    }

    pub fn application_octet_stream() -> Self {
        Self(mime::APPLICATION_OCTET_STREAM)
    }

    pub fn mime(&self) -> &Mime {
        &self.0
    }

    pub fn kind(&self) -> &str {
        self.0.type_().as_str()
    }

    pub fn subtype(&self) -> &str {
        self.0.subtype().as_str()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.0.get_param(name).map(|value| value.as_str())
    }

    pub fn is_wildcard_type(&self) -> bool {
        self.0.type_() == mime::STAR
    }

    pub fn is_wildcard_subtype(&self) -> bool {
        self.0.subtype() == mime::STAR
    }

    pub fn is_concrete(&self) -> bool {
        !self.is_wildcard_type() && !self.is_wildcard_subtype()
    }

    /// Whether the two types overlap, treating `*` on either side as a match.
    pub fn is_compatible(&self, other: &MediaType) -> bool {
        let kind = self.is_wildcard_type()
            || other.is_wildcard_type()
            || self.0.type_() == other.0.type_();
        let subtype = self.is_wildcard_subtype()
            || other.is_wildcard_subtype()
            || self.0.subtype() == other.0.subtype();
        kind && subtype
    }

    /// Quality factor from the `q` parameter, defaulting to 1.0.
    pub fn quality(&self) -> f32 {
        self.param("q")
            .and_then(|q| q.parse::<f32>().ok())
            .map(|q| q.clamp(0.0, 1.0))
            .unwrap_or(1.0)
    }

    /// 0 for `*/*`, 1 for `type/*`, 2 for a concrete type.
    pub fn specificity(&self) -> u8 {
        match (self.is_wildcard_type(), self.is_wildcard_subtype()) {
            (true, _) => 0,
            (false, true) => 1,
            (false, false) => 2,
        }
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        self.0.essence_str().to_string()
    }

    /// The same type with every parameter dropped.
    pub fn without_params(&self) -> MediaType {
        match self.0.essence_str().parse::<Mime>() {
            Ok(essence) => Self(essence),
            Err(_) => self.clone(),
        }
    }
}

impl From<Mime> for MediaType {
    fn from(mime: Mime) -> Self {
        Self(mime)
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MediaTypeError::Empty);
        }
        // a bare "*" is sent by some clients for "*/*"
        if trimmed == "*" {
            return Ok(Self::wildcard());
        }
        trimmed
            .parse::<Mime>()
            .map(Self)
            .map_err(|source| MediaTypeError::Invalid {
                value: s.to_string(),
                source,
            })
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Parses an `Accept` header into media ranges, best first.
///
/// Ranges with `q=0` are dropped. Equal qualities keep the more specific
/// range first, then header order. A missing or empty header accepts `*/*`.
pub fn parse_accept(header: Option<&str>) -> Result<Vec<MediaType>, MediaTypeError> {
    let Some(header) = header.filter(|h| !h.trim().is_empty()) else {
        return Ok(vec![MediaType::wildcard()]);
    };
    let mut ranges = header
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::parse::<MediaType>)
        .collect::<Result<Vec<_>, _>>()?;
    ranges.retain(|r| r.quality() > 0.0);
    ranges.sort_by(|a, b| {
        b.quality()
            .partial_cmp(&a.quality())
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.specificity().cmp(&a.specificity()))
    });
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse() {
        let media: MediaType = "Application/JSON; charset=utf-8".parse().unwrap();
        assert_eq!(media.kind(), "application");
        assert_eq!(media.subtype(), "json");
        assert_eq!(media.param("charset"), Some("utf-8"));
        assert_eq!(media.essence(), "application/json");
        assert_eq!(media.without_params(), MediaType::application_json());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("".parse::<MediaType>(), Err(MediaTypeError::Empty)));
        assert!(matches!("text".parse::<MediaType>(), Err(MediaTypeError::Invalid { .. })));
        assert!(matches!(
            "text/plain; charset".parse::<MediaType>(),
            Err(MediaTypeError::Invalid { .. })
        ));
    }

    #[test]
    fn test_bare_star_is_wildcard() {
        assert_eq!("*".parse::<MediaType>().unwrap(), MediaType::wildcard());
    }

    #[test]
    fn test_compatibility() {
        let json = MediaType::application_json();
        assert!(json.is_compatible(&MediaType::wildcard()));
        assert!(json.is_compatible(&"application/*".parse().unwrap()));
        assert!(!json.is_compatible(&MediaType::text_plain()));
    }

    #[test]
    fn test_accept_ordering() {
        let ranges = parse_accept(Some("text/*;q=0.5, application/json, */*;q=0.1, image/png;q=0")).unwrap();
        let essences: Vec<_> = ranges.iter().map(MediaType::essence).collect();
        assert_eq!(essences, ["application/json", "text/*", "*/*"]);
    }

    #[test]
    fn test_missing_accept_is_wildcard() {
        assert_eq!(parse_accept(None).unwrap(), vec![MediaType::wildcard()]);
        assert_eq!(parse_accept(Some(" ")).unwrap(), vec![MediaType::wildcard()]);
    }
}
