//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges (timeouts > 0)
//! - Reject a static origin pattern that does not compile
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{OriginConfig, RelayConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("origin.allowed_pattern does not compile: {0}")]
    Pattern(String),

    #[error("origin.env_var must not be empty")]
    EmptyEnvVar,
}

pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(obs.metrics_address.clone()));
    }

    let timeouts = [
        ("upstream.connect_timeout_secs", config.upstream.connect_timeout_secs),
        ("upstream.request_timeout_secs", config.upstream.request_timeout_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if let Some(pattern) = &config.origin.allowed_pattern {
        if let Err(e) = regex::bytes::Regex::new(pattern) {
            errors.push(ValidationError::Pattern(e.to_string()));
        }
    } else if config.origin.env_var.trim().is_empty() {
        errors.push(ValidationError::EmptyEnvVar);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Non-fatal observations about the origin policy, logged at startup.
pub fn origin_policy_warnings(origin: &OriginConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let pattern = origin.resolve_pattern();

    if origin.allowed_pattern.is_none() && std::env::var_os(&origin.env_var).is_none() {
        warnings.push(format!(
            "{} is not set; every origin will be allowed until it is",
            origin.env_var
        ));
    } else if pattern.is_empty() {
        warnings.push("allowed-origin pattern is empty; every origin is allowed".to_string());
    } else if !pattern.starts_with('^') {
        warnings.push(format!(
            "allowed-origin pattern {:?} is not anchored with '^'; it matches anywhere in the origin",
            pattern
        ));
    }

    warnings
}
