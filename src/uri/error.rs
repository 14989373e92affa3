//! Template compilation and URI building errors.

use thiserror::Error;

use crate::uri::component::UriComponent;

/// A template that cannot be compiled. Raised once, at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("invalid URI template {template}: '{{' at {position} is not closed by '}}'")]
    Unclosed { template: String, position: usize },

    #[error("invalid URI template {template}: unexpected '}}' at {position}")]
    UnexpectedClose { template: String, position: usize },

    #[error("invalid URI template {template}: empty variable name at {position}")]
    EmptyName { template: String, position: usize },

    #[error("invalid URI template {template}: bad regular expression for {name}: {reason}")]
    InvalidRegex {
        template: String,
        name: String,
        reason: String,
    },
}

/// Errors raised while substituting values into a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid URI template {part}: '{{' is not closed by '}}'")]
    MalformedTemplate { part: String },

    #[error("missing value for parameter {0}")]
    MissingValue(String),

    #[error("illegal character {character:?} in {component} value {value:?}")]
    IllegalCharacter {
        component: UriComponent,
        value: String,
        character: char,
    },
}
