//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the resilient API client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend API settings (base URL, timeouts).
    pub api: ApiConfig,

    /// Where session tokens come from.
    pub session: SessionConfig,

    /// Token refresh coordination (retries, backoff, cooldown).
    pub coordinator: CoordinatorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every request path is joined onto (e.g., "http://localhost:4000/api").
    pub base_url: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api".to_string(),
            request_timeout_secs: 30,
            user_agent: concat!("resilient-fetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Session token provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionConfig {
    /// Fixed token.
    Static { token: String },

    /// Token read from an environment variable on every lookup.
    Env {
        #[serde(default = "default_session_var")]
        var: String,
    },

    /// Token read from a file on every lookup.
    File { path: String },

    /// Token read from a session endpoint returning JSON.
    Http {
        url: String,

        /// Cookie header forwarded to the session endpoint.
        #[serde(default)]
        cookie: Option<String>,

        /// JSON field holding the bearer token.
        #[serde(default = "default_token_field")]
        token_field: String,
    },
}

fn default_session_var() -> String {
    "DASHBOARD_SESSION_TOKEN".to_string()
}

fn default_token_field() -> String {
    "accessToken".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::Env {
            var: default_session_var(),
        }
    }
}

/// Token coordinator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Maximum number of refresh attempts before giving up until reset.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Minimum time between two refresh attempts in milliseconds.
    pub cooldown_ms: u64,

    /// Random jitter added to each backoff delay, as a fraction of it.
    /// 0.0 keeps delays exact.
    pub jitter_ratio: f64,

    /// Deadline for a single session lookup in milliseconds. Unset means none.
    pub lookup_timeout_ms: Option<u64>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            cooldown_ms: 5000,
            jitter_ratio: 0.0,
            lookup_timeout_ms: None,
        }
    }
}

impl CoordinatorConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout_ms.map(Duration::from_millis)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.coordinator.max_retries, 3);
        assert_eq!(config.coordinator.cooldown(), Duration::from_secs(5));
        assert!(config.coordinator.lookup_timeout().is_none());
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_session_kinds_parse() {
        let config: ClientConfig = toml::from_str(
            r#"
            [session]
            kind = "http"
            url = "http://localhost:3000/api/auth/session"
            "#,
        )
        .unwrap();

        match config.session {
            SessionConfig::Http { url, cookie, token_field } => {
                assert_eq!(url, "http://localhost:3000/api/auth/session");
                assert!(cookie.is_none());
                assert_eq!(token_field, "accessToken");
            }
            other => panic!("unexpected session config: {:?}", other),
        }

        let config: ClientConfig = toml::from_str(
            r#"
            [session]
            kind = "env"
            "#,
        )
        .unwrap();
        assert_eq!(config.session, SessionConfig::default());
    }
}
