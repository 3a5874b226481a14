//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the CDN proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, connection limits).
    pub listener: ListenerConfig,

    /// Contact address included in rejection messages.
    pub contact: String,

    /// Maximum file size in megabytes (0 = unlimited).
    pub max_file_size_mb: u64,

    /// Allowed file extensions, each starting with '.' (empty = unlimited).
    pub allowed_extensions: Vec<String>,

    /// Cache max-age in seconds for proxied responses.
    pub cache_max_age_secs: u64,

    /// Access-list mode applied to repositories, packages, and referers.
    pub list_mode: ListMode,

    /// Hosted-repository (owner/name) access lists.
    pub github_repos: ListPair,

    /// Registry-package (package name) access lists.
    pub npm_packages: ListPair,

    /// Referer-site access lists.
    pub sites: ListPair,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// True when no policy restriction and no size limit is configured.
    ///
    /// In this state requests take the abbreviated fast path and no policy
    /// gate is evaluated at all.
    pub fn is_unrestricted(&self) -> bool {
        self.list_mode == ListMode::None
            && self.allowed_extensions.is_empty()
            && self.max_file_size_mb == 0
    }

    /// Size limit in bytes, or `None` when unlimited.
    pub fn max_file_size_bytes(&self) -> Option<u64> {
        (self.max_file_size_mb > 0).then(|| self.max_file_size_mb * 1024 * 1024)
    }
}

/// Access-list mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// No identity or referer restrictions.
    #[default]
    None,
    /// Entries in the blacklist are rejected; everything else passes.
    Blacklist,
    /// Only entries in the whitelist pass.
    Whitelist,
}

/// A blacklist/whitelist pair for one identity kind.
///
/// Which list applies is decided by [`ListMode`]; the other is ignored.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ListPair {
    /// Used in blacklist mode (entries are rejected).
    pub blacklist: Vec<String>,

    /// Used in whitelist mode (only entries pass).
    pub whitelist: Vec<String>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
