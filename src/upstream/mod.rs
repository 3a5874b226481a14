//! Outbound transport seam.
//!
//! # Data Flow
//! ```text
//! pipeline builds UpstreamRequest (method, url, headers, optional body)
//!     → UpstreamClient::fetch (reqwest in production, scripted mock in tests)
//!     → UpstreamResponse (status, headers, streamed or buffered body)
//!     → pipeline enforces size limit, builds the client response
//! ```
//!
//! # Design Decisions
//! - The pipeline only sees the trait; TLS, pooling, and connection reuse
//!   live in the reqwest implementation
//! - One attempt per request, no retry: a failed fetch is surfaced once
//! - Bodies stay streamed unless size enforcement has to measure them

mod client;

pub use client::ReqwestUpstream;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, StatusCode};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;

/// Host of the fixed upstream origin.
pub const UPSTREAM_HOST: &str = "cdn.jsdelivr.net";

/// Origin every proxied path is appended to.
pub const UPSTREAM_ORIGIN: &str = "https://cdn.jsdelivr.net";

/// Error type for outbound fetches.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to read upstream body: {0}")]
    Body(String),
}

/// A request ready to be sent to the upstream origin.
#[derive(Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// Attached only for methods other than GET/HEAD.
    pub body: Option<Bytes>,
}

/// Body of an upstream response.
///
/// Streamed by default; buffered when size enforcement had to measure it
/// (or when a mock scripts it that way).
pub enum UpstreamBody {
    Buffered(Bytes),
    Stream(BoxStream<'static, Result<Bytes, UpstreamError>>),
}

impl UpstreamBody {
    /// Read the whole body into memory.
    pub async fn buffer(self) -> Result<Bytes, UpstreamError> {
        match self {
            UpstreamBody::Buffered(bytes) => Ok(bytes),
            UpstreamBody::Stream(stream) => {
                let chunks: Vec<Bytes> = stream.try_collect().await?;
                Ok(chunks.concat().into())
            }
        }
    }

    /// Convert into a response body, streaming when possible.
    pub fn into_body(self) -> Body {
        match self {
            UpstreamBody::Buffered(bytes) => Body::from(bytes),
            UpstreamBody::Stream(stream) => {
                Body::from_stream(stream.map_err(|e| std::io::Error::other(e.to_string())))
            }
        }
    }
}

/// A response received from the upstream origin.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    /// Declared content length, if the upstream sent one.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(axum::http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

/// Abstract outbound HTTP capability the pipeline forwards through.
pub trait UpstreamClient: Send + Sync {
    /// Issue the outbound request and return the upstream's response.
    fn fetch(
        &self,
        request: UpstreamRequest,
    ) -> BoxFuture<'static, Result<UpstreamResponse, UpstreamError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn buffering_concatenates_stream_chunks() {
        let chunks = vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ];
        let body = UpstreamBody::Stream(Box::pin(stream::iter(chunks)));
        assert_eq!(body.buffer().await.unwrap(), Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn declared_length_is_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", "1024".parse().unwrap());
        let response = UpstreamResponse {
            status: StatusCode::OK,
            headers,
            body: UpstreamBody::Buffered(Bytes::new()),
        };
        assert_eq!(response.content_length(), Some(1024));

        let response = UpstreamResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: UpstreamBody::Buffered(Bytes::new()),
        };
        assert_eq!(response.content_length(), None);
    }
}
