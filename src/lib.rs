//! Policy-gated reverse proxy for a fixed CDN origin.
//!
//! Forwards requests to `cdn.jsdelivr.net`, applying configurable access
//! checks (file type, repository and package identity, referer) before
//! forwarding, and rewriting headers on both the request and response legs.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod policy;
pub mod upstream;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
