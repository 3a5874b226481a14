//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parseable)
//! - Check extension list entries are well-formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("allowed extension '{0}' must start with '.'")]
    ExtensionFormat(String),

    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("max connections must be greater than zero")]
    ZeroConnections,
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for ext in &config.allowed_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            errors.push(ValidationError::ExtensionFormat(ext.clone()));
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    // The value feeds the concurrency limit; zero would deadlock the router.
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
