//! Configuration validation.
//!
//! Serde handles the syntax; this module checks value ranges and that
//! every URL and address actually parses. All problems are reported at
//! once rather than stopping at the first.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{ClientConfig, SessionConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound on `coordinator.max_retries`; beyond this the backoff
/// delay is always clamped to `max_delay_ms` anyway.
pub const MAX_RETRIES_LIMIT: u32 = 16;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
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

/// Validate a parsed configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.api.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "api.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("api.base_url", e.to_string())),
    }
    if config.api.request_timeout_secs == 0 {
        errors.push(ValidationError::new("api.request_timeout_secs", "must be greater than 0"));
    }

    validate_session(&config.session, &mut errors);

    let coordinator = &config.coordinator;
    if coordinator.max_retries > MAX_RETRIES_LIMIT {
        errors.push(ValidationError::new(
            "coordinator.max_retries",
            format!("must be at most {}", MAX_RETRIES_LIMIT),
        ));
    }
    if coordinator.base_delay_ms == 0 {
        errors.push(ValidationError::new("coordinator.base_delay_ms", "must be greater than 0"));
    }
    if coordinator.max_delay_ms < coordinator.base_delay_ms {
        errors.push(ValidationError::new(
            "coordinator.max_delay_ms",
            "must not be smaller than base_delay_ms",
        ));
    }
    if !(0.0..=1.0).contains(&coordinator.jitter_ratio) {
        errors.push(ValidationError::new("coordinator.jitter_ratio", "must be between 0 and 1"));
    }
    if coordinator.lookup_timeout_ms == Some(0) {
        errors.push(ValidationError::new(
            "coordinator.lookup_timeout_ms",
            "must be greater than 0 when set",
        ));
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", observability.log_level),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_session(session: &SessionConfig, errors: &mut Vec<ValidationError>) {
    match session {
        SessionConfig::Static { token } if token.trim().is_empty() => {
            errors.push(ValidationError::new("session.token", "must not be empty"));
        }
        SessionConfig::Env { var } if var.trim().is_empty() => {
            errors.push(ValidationError::new("session.var", "must not be empty"));
        }
        SessionConfig::File { path } if path.trim().is_empty() => {
            errors.push(ValidationError::new("session.path", "must not be empty"));
        }
        SessionConfig::Http { url, token_field, .. } => {
            if Url::parse(url).is_err() {
                errors.push(ValidationError::new("session.url", format!("invalid URL '{}'", url)));
            }
            if token_field.trim().is_empty() {
                errors.push(ValidationError::new("session.token_field", "must not be empty"));
            }
        }
        _ => {}
    }
}
