//! Semantic configuration checks.
//!
//! Serde guarantees the shape of the config; this module checks the values.
//! Every problem is collected so a bad file is fixed in one round.

use std::fmt;
use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::schema::DispatcherConfig;

/// A single invalid config value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `listener.bind_address`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &DispatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    if config.dispatch.max_entity_bytes == 0 {
        errors.push(ValidationError::new("dispatch.max_entity_bytes", "must be greater than zero"));
    }

    let observability = &config.observability;
    if let Err(e) = EnvFilter::try_new(&observability.log_level) {
        errors.push(ValidationError::new("observability.log_level", e.to_string()));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {}", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
