//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses well-formed)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{ServerConfig, VersionMode};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address must be host:port, got {0:?}")]
    BindAddress(String),

    #[error("shutdown.timeout_secs must be greater than zero")]
    ShutdownTimeout,

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("health.path must start with '/', got {0:?}")]
    HealthPath(String),

    #[error("health.version_env must not be empty in env mode")]
    VersionEnv,

    #[error("observability.metrics_address is not a socket address: {0:?}")]
    MetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let bind = config.listener.bind_address.trim();
    match bind.rsplit_once(':') {
        Some((_, port)) if !port.is_empty() && port.parse::<u16>().is_ok() => {}
        _ => errors.push(ValidationError::BindAddress(bind.to_string())),
    }

    if config.shutdown.timeout_secs == 0 {
        errors.push(ValidationError::ShutdownTimeout);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if !config.health.path.starts_with('/') {
        errors.push(ValidationError::HealthPath(config.health.path.clone()));
    }

    if config.health.version_mode == VersionMode::Env && config.health.version_env.trim().is_empty() {
        errors.push(ValidationError::VersionEnv);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
