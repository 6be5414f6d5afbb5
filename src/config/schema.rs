//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Environment variable holding the allowed-origin pattern by default.
pub const DEFAULT_ORIGIN_ENV: &str = "ALLOWED_ORIGIN_REGEXP";

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where the allowed-origin pattern comes from.
    pub origin: OriginConfig,

    /// Outbound client settings.
    pub upstream: UpstreamConfig,

    /// Inbound timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Allowed-origin pattern source.
///
/// A static `allowed_pattern` wins; otherwise `env_var` is read on every
/// request, so changing the environment takes effect without a restart.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OriginConfig {
    /// Regular expression matched against the `Origin` header.
    pub allowed_pattern: Option<String>,

    /// Environment variable consulted when `allowed_pattern` is unset.
    pub env_var: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            allowed_pattern: None,
            env_var: DEFAULT_ORIGIN_ENV.to_string(),
        }
    }
}

impl OriginConfig {
    /// Pattern in effect right now. An unset variable reads as `""`.
    pub fn resolve_pattern(&self) -> Cow<'_, str> {
        match &self.allowed_pattern {
            Some(pattern) => Cow::Borrowed(pattern),
            None => Cow::Owned(std::env::var(&self.env_var).unwrap_or_default()),
        }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total time for one upstream fetch, body included, in seconds.
    pub request_timeout_secs: u64,

    /// Redirects followed before giving up.
    pub max_redirects: usize,

    /// `User-Agent` sent upstream.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            max_redirects: 10,
            user_agent: concat!("cors-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Inbound timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time to answer the caller) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
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
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
