//! URI component character classes (RFC 3986).
//!
//! Values substituted into a template are either percent-encoded or checked
//! against the characters their component allows. Template literals go
//! through [`encode_literal`], which keeps escapes that are already present.

use std::fmt;

use percent_encoding::{percent_encode, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const UNRESERVED_SUB_DELIMS: &AsciiSet = &UNRESERVED
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

const SCHEME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'+').remove(b'-').remove(b'.');
const PORT: &AsciiSet = &digits_only();
const USER_INFO: &AsciiSet = &UNRESERVED_SUB_DELIMS.remove(b':');
const HOST: &AsciiSet = &UNRESERVED_SUB_DELIMS.remove(b'[').remove(b']').remove(b':');
const PATH_SEGMENT: &AsciiSet = &UNRESERVED_SUB_DELIMS.remove(b':').remove(b'@');
const PATH: &AsciiSet = &PATH_SEGMENT.remove(b'/');
const QUERY: &AsciiSet = &PATH.remove(b'?');

const fn digits_only() -> AsciiSet {
    let mut set = NON_ALPHANUMERIC.add(b'a');
    let mut c = b'a';
    while c <= b'z' {
        set = set.add(c).add(c.to_ascii_uppercase());
        c += 1;
    }
    set
}

/// A syntactic part of a URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UriComponent {
    Scheme,
    UserInfo,
    Host,
    Port,
    Path,
    PathSegment,
    Query,
    Fragment,
}

impl UriComponent {
    /// Bytes that must be escaped in this component.
    pub fn escaped(self) -> &'static AsciiSet {
        match self {
            Self::Scheme => SCHEME,
            Self::UserInfo => USER_INFO,
            Self::Host => HOST,
            Self::Port => PORT,
            Self::Path => PATH,
            Self::PathSegment => PATH_SEGMENT,
            Self::Query | Self::Fragment => QUERY,
        }
    }

    /// Returns true if `byte` may appear unescaped in this component.
    pub fn is_allowed(self, byte: u8) -> bool {
        byte.is_ascii()
            && percent_encode(&[byte], self.escaped())
                .next()
                .is_some_and(|chunk| !chunk.starts_with('%'))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Scheme => "scheme",
            Self::UserInfo => "user-info",
            Self::Host => "host",
            Self::Port => "port",
            Self::Path => "path",
            Self::PathSegment => "path segment",
            Self::Query => "query",
            Self::Fragment => "fragment",
        }
    }
}

impl fmt::Display for UriComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_escape(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b'%'
        && bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
        && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit)
}

/// Percent-encodes every byte of `value` not allowed in `component`,
/// including `%` itself.
pub fn encode(value: &str, component: UriComponent) -> String {
    utf8_percent_encode(value, component.escaped()).to_string()
}

/// Like [`encode`], but leaves well-formed `%XX` escapes untouched.
pub fn encode_literal(value: &str, component: UriComponent) -> String {
    let set = component.escaped();
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(at) = (0..rest.len()).find(|&i| is_escape(rest.as_bytes(), i)) {
        out.extend(utf8_percent_encode(&rest[..at], set));
        out.push_str(&rest[at..at + 3]);
        rest = &rest[at + 3..];
    }
    out.extend(utf8_percent_encode(rest, set));
    out
}

/// Checks that `value` only holds characters legal in `component` or
/// well-formed escapes. Returns the first offending character.
pub fn validate(value: &str, component: UriComponent) -> Result<(), char> {
    let bytes = value.as_bytes();
    for (i, c) in value.char_indices() {
        let legal = c.is_ascii() && (component.is_allowed(c as u8) || is_escape(bytes, i));
        if !legal {
            return Err(c);
        }
    }
    Ok(())
}
