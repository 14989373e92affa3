//! URI template compilation.
//!
//! Turns `/books/{id}/{page: [0-9]+}` into an anchorable regex plus the
//! metadata needed to extract and rank matches:
//!
//! ```text
//! template:       /books/{id}/{page: [0-9]+}
//! regex:          /books/([^/]+)/([0-9]+)(/.*)?
//! literal chars:  8
//! names:          [id, page]
//! groups:         [1, 2] + remainder 3
//! ```

use regex::Regex;

use crate::uri::component::{encode_literal, UriComponent};
use crate::uri::error::TemplateError;

/// Regex used for `{name}` variables without an explicit expression.
pub const DEFAULT_VARIABLE_REGEX: &str = "[^/]+";

/// Appended to every non-empty template so a match can leave a remainder for
/// sub-resource dispatch.
pub const PATTERN_TAIL: &str = "(/.*)?";

/// Compiled form of a URI template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledTemplate {
    template: String,
    regex: String,
    literal_chars: usize,
    parameter_names: Vec<String>,
    /// One capture-group index per variable occurrence, then the remainder.
    group_indexes: Vec<usize>,
}

impl CompiledTemplate {
    /// The normalized template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The regex, including the remainder group for non-empty templates.
    pub fn regex(&self) -> &str {
        &self.regex
    }

    /// Number of template characters not produced by variables.
    pub fn literal_chars(&self) -> usize {
        self.literal_chars
    }

    /// Variable names, one entry per occurrence.
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    pub fn group_indexes(&self) -> &[usize] {
        &self.group_indexes
    }

    /// Capture-group index of the unmatched remainder.
    pub fn remainder_group(&self) -> Option<usize> {
        self.group_indexes.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.template.is_empty()
    }
}

/// Prefixes a non-empty template with `/` when it lacks one.
pub fn normalize(template: &str) -> String {
    if template.is_empty() || template.starts_with('/') {
        template.to_string()
    } else {
        format!("/{template}")
    }
}

/// Finds the `}` closing the `{` at byte offset `open`, honouring braces
/// nested inside a custom regex such as `{code: [0-9]{3}}`.
pub(crate) fn find_close(template: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in template[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits a variable body into its name and optional regex.
pub(crate) fn split_variable(body: &str) -> (&str, Option<&str>) {
    match body.split_once(':') {
        Some((name, regex)) => {
            let regex = regex.trim();
            (name.trim(), (!regex.is_empty()).then_some(regex))
        }
        None => (body.trim(), None),
    }
}

/// Compiles a URI template.
pub fn compile(template: &str) -> Result<CompiledTemplate, TemplateError> {
    let template = normalize(template);
    if template.is_empty() {
        return Ok(CompiledTemplate {
            template,
            regex: String::new(),
            literal_chars: 0,
            parameter_names: Vec::new(),
            group_indexes: Vec::new(),
        });
    }

    let mut regex = String::with_capacity(template.len() + PATTERN_TAIL.len());
    let mut literal = String::new();
    let mut literal_chars = 0;
    let mut parameter_names = Vec::new();
    let mut group_indexes = Vec::new();
    let mut next_group = 1;

    let mut pos = 0;
    while pos < template.len() {
        let rest = &template[pos..];
        let Some(offset) = rest.find(['{', '}']) else {
            literal.push_str(rest);
            break;
        };
        literal.push_str(&rest[..offset]);
        let open = pos + offset;
        if template[open..].starts_with('}') {
            return Err(TemplateError::UnexpectedClose {
                template: template.clone(),
                position: open,
            });
        }

        literal_chars += flush_literal(&mut literal, &mut regex);

        let close = find_close(&template, open).ok_or_else(|| TemplateError::Unclosed {
            template: template.clone(),
            position: open,
        })?;
        let (name, custom) = split_variable(&template[open + 1..close]);
        if name.is_empty() {
            return Err(TemplateError::EmptyName {
                template: template.clone(),
                position: open,
            });
        }

        let expression = custom.unwrap_or(DEFAULT_VARIABLE_REGEX);
        let inner_groups = Regex::new(expression)
            .map_err(|e| TemplateError::InvalidRegex {
                template: template.clone(),
                name: name.to_string(),
                reason: e.to_string(),
            })?
            .captures_len()
            - 1;

        parameter_names.push(name.to_string());
        group_indexes.push(next_group);
        next_group += 1 + inner_groups;

        regex.push('(');
        regex.push_str(expression);
        regex.push(')');

        pos = close + 1;
    }
    literal_chars += flush_literal(&mut literal, &mut regex);

    // "/books/" and "/books" are the same resource
    if regex.ends_with('/') {
        regex.pop();
        literal_chars -= 1;
    }
    regex.push_str(PATTERN_TAIL);
    group_indexes.push(next_group);

    Ok(CompiledTemplate {
        template,
        regex,
        literal_chars,
        parameter_names,
        group_indexes,
    })
}

/// Appends the pending literal run to `regex` and returns how many literal
/// characters it contributed.
fn flush_literal(literal: &mut String, regex: &mut String) -> usize {
    if literal.is_empty() {
        return 0;
    }
    let encoded = encode_literal(literal, UriComponent::Path);
    regex.push_str(&regex::escape(&encoded));
    literal.clear();
    encoded.chars().count()
}
