//! Header transformation for both proxy legs.
//!
//! # Responsibilities
//! - Build the outbound request header set (allow-list copy + forced host)
//! - Build the inbound response header set (allow-list copy + injected
//!   cache, CORS, and security headers)
//! - Provide the reduced fast-path variants alongside the full ones
//!
//! # Design Decisions
//! - Headers are copied by allow-list, never wholesale: anything not named
//!   here (cookies, authorization, upstream cache-control, upstream CORS)
//!   does not cross the proxy
//! - The fast outbound variant skips `cache-control` so the upstream's CDN
//!   caching is never bypassed on the unrestricted path

use axum::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, HOST, USER_AGENT, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS,
};

use crate::upstream::UPSTREAM_HOST;

/// Fallback user-agent when the client did not send one (fast path only).
const FALLBACK_USER_AGENT: &str = "Mozilla/5.0";

/// Request headers copied on the fast path.
const OUTBOUND_FAST: &[&str] = &["accept", "accept-encoding", "accept-language"];

/// Request headers copied on the full path.
const OUTBOUND_FULL: &[&str] = &[
    "accept",
    "accept-encoding",
    "accept-language",
    "cache-control",
    "user-agent",
];

/// Response headers copied on the fast path.
const INBOUND_FAST: &[&str] = &["content-type", "content-length", "etag", "last-modified"];

/// Response headers copied on the full path.
const INBOUND_FULL: &[&str] = &[
    "content-type",
    "content-encoding",
    "content-disposition",
    "etag",
    "last-modified",
];

fn copy_allowed(source: &HeaderMap, names: &[&'static str]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in names {
        if let Some(value) = source.get(*name) {
            headers.insert(
                axum::http::header::HeaderName::from_static(name),
                value.clone(),
            );
        }
    }
    headers
}

/// Outbound headers for the unrestricted fast path.
pub fn outbound_fast(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = copy_allowed(incoming, OUTBOUND_FAST);
    headers.insert(HOST, HeaderValue::from_static(UPSTREAM_HOST));
    let user_agent = incoming
        .get(USER_AGENT)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_USER_AGENT));
    headers.insert(USER_AGENT, user_agent);
    headers
}

/// Outbound headers for the fully-checked path.
pub fn outbound_full(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = copy_allowed(incoming, OUTBOUND_FULL);
    headers.insert(HOST, HeaderValue::from_static(UPSTREAM_HOST));
    headers
}

/// Inbound headers for the unrestricted fast path.
///
/// Cache and CORS policy is always the proxy's own, never the upstream's.
pub fn inbound_fast(upstream: &HeaderMap, cache_max_age_secs: u64) -> HeaderMap {
    let mut headers = copy_allowed(upstream, INBOUND_FAST);
    headers.insert(
        CACHE_CONTROL,
        cache_control_value(cache_max_age_secs),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers
}

/// Inbound headers for the fully-checked path.
pub fn inbound_full(upstream: &HeaderMap, cache_max_age_secs: u64) -> HeaderMap {
    let mut headers = copy_allowed(upstream, INBOUND_FULL);

    if cache_max_age_secs > 0 {
        headers.insert(CACHE_CONTROL, cache_control_value(cache_max_age_secs));
    }

    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, HEAD, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Origin, X-Requested-With, Content-Type, Accept"),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers
}

fn cache_control_value(max_age_secs: u64) -> HeaderValue {
    HeaderValue::from_str(&format!("public, max-age={}", max_age_secs))
        .unwrap_or_else(|_| HeaderValue::from_static("public"))
}
