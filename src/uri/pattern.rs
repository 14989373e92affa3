//! Compiled URI patterns: matching, extraction and ranking.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;

use crate::uri::error::TemplateError;
use crate::uri::template::{compile, CompiledTemplate};

/// Returns true if a match remainder means the path was fully consumed.
pub fn is_terminal(remainder: Option<&str>) -> bool {
    matches!(remainder, None | Some("/"))
}

/// A compiled template ready for matching.
///
/// Patterns are ordered by specificity: `a < b` means `a` is preferred when
/// both match the same path. Equality and hashing only look at the regex, so
/// `/books/{id}` and `/books/{isbn}` are the same pattern.
#[derive(Debug, Clone)]
pub struct UriPattern {
    compiled: CompiledTemplate,
    /// `None` for the empty template.
    matcher: Option<Regex>,
}

impl UriPattern {
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        let compiled = compile(template)?;
        let matcher = if compiled.is_empty() {
            None
        } else {
            let anchored = format!("^(?:{})$", compiled.regex());
            let regex = Regex::new(&anchored).map_err(|e| TemplateError::InvalidRegex {
                template: compiled.template().to_string(),
                name: String::new(),
                reason: e.to_string(),
            })?;
            Some(regex)
        };
        Ok(Self { compiled, matcher })
    }

    /// The pattern of the empty template. Matches only the empty path.
    pub fn empty() -> Self {
        Self {
            compiled: CompiledTemplate::default(),
            matcher: None,
        }
    }

    pub fn template(&self) -> &str {
        self.compiled.template()
    }

    pub fn regex(&self) -> &str {
        self.compiled.regex()
    }

    pub fn literal_chars(&self) -> usize {
        self.compiled.literal_chars()
    }

    pub fn parameter_names(&self) -> &[String] {
        self.compiled.parameter_names()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    /// Matches `path` and writes the extracted values into `out`.
    ///
    /// On success `out` is cleared, then holds one value per variable
    /// occurrence followed by the remainder (`None` or a `/`-prefixed
    /// string). On failure `out` is left untouched.
    pub fn matches(&self, path: &str, out: &mut Vec<Option<String>>) -> bool {
        if path.is_empty() {
            if self.is_empty() {
                out.clear();
                out.push(None);
                return true;
            }
            return false;
        }
        let Some(matcher) = &self.matcher else {
            return false;
        };
        let Some(captures) = matcher.captures(path) else {
            return false;
        };

        out.clear();
        out.extend(
            self.compiled
                .group_indexes()
                .iter()
                .map(|&group| captures.get(group).map(|m| m.as_str().to_string())),
        );
        true
    }

    /// Allocating variant of [`UriPattern::matches`].
    pub fn match_path(&self, path: &str) -> Option<UriMatch> {
        let mut values = Vec::with_capacity(self.parameter_names().len() + 1);
        self.matches(path, &mut values).then_some(UriMatch { values })
    }
}

impl Default for UriPattern {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for UriPattern {
    fn eq(&self, other: &Self) -> bool {
        self.regex() == other.regex()
    }
}

impl Eq for UriPattern {}

impl Hash for UriPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.regex().hash(state);
    }
}

impl Ord for UriPattern {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }
        other
            .literal_chars()
            .cmp(&self.literal_chars())
            .then_with(|| {
                self.parameter_names()
                    .len()
                    .cmp(&other.parameter_names().len())
            })
            .then_with(|| self.regex().cmp(other.regex()))
    }
}

impl PartialOrd for UriPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for UriPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.regex())
    }
}

/// Values extracted by a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriMatch {
    values: Vec<Option<String>>,
}

impl UriMatch {
    /// One value per variable occurrence, without the remainder.
    pub fn values(&self) -> &[Option<String>] {
        &self.values[..self.values.len() - 1]
    }

    pub fn remainder(&self) -> Option<&str> {
        self.values.last().and_then(|v| v.as_deref())
    }

    pub fn is_terminal(&self) -> bool {
        is_terminal(self.remainder())
    }

    pub fn into_inner(self) -> Vec<Option<String>> {
        self.values
    }
}
