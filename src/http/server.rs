//! HTTP server setup and the request-gating pipeline.
//!
//! # Responsibilities
//! - Create the Axum router (root redirect + catch-all proxy handler)
//! - Wire up middleware (tracing, timeout, request ID)
//! - Run the pipeline: policy gates → outbound fetch → size enforcement
//!   → response construction
//! - Choose between the fast unrestricted path and the fully-checked path
//!
//! # Pipeline
//! ```text
//! request ── "/" ──────────────▶ 302 /index.html
//!    │
//!    ├─ unrestricted config ───▶ fast forward (fast header variants,
//!    │                           no policy evaluation)
//!    └─ otherwise ─────────────▶ gates (415/403 on first failure)
//!                                → full outbound headers → fetch
//!                                → mirror non-2xx → size enforcement (413)
//!                                → streamed or buffered response
//! ```
//! Any unexpected failure is caught at the handler boundary and reduced to
//! a generic 500; the underlying error is only logged.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::http::headers;
use crate::http::request::{RequestIdLayer, X_REQUEST_ID};
use crate::http::response::{error_response, rejection_response};
use crate::policy;
use crate::upstream::{
    ReqwestUpstream, UpstreamClient, UpstreamError, UpstreamRequest, UpstreamResponse,
    UPSTREAM_ORIGIN,
};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub upstream: Arc<dyn UpstreamClient>,
}

/// Cap on buffered non-GET/HEAD request bodies before the transport seam.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Errors inside the pipeline that are not policy or upstream-status
/// outcomes. Only the body-size rejection reaches the client in detail.
#[derive(Debug, thiserror::Error)]
enum PipelineError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("failed to read request body: {0}")]
    RequestBody(axum::Error),

    #[error("request body exceeds the proxy limit")]
    RequestBodyTooLarge,
}

/// HTTP server for the CDN proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
}

impl HttpServer {
    /// Create a server using the production reqwest transport.
    pub fn new(config: ProxyConfig) -> Self {
        Self::with_upstream(config, Arc::new(ReqwestUpstream::new()))
    }

    /// Create a server with an explicit transport (tests inject mocks here).
    pub fn with_upstream(config: ProxyConfig, upstream: Arc<dyn UpstreamClient>) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            upstream,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// `RequestIdLayer` is outermost so the trace span and every inner layer
    /// see the correlation ID. The concurrency limit shares one semaphore
    /// across connections, bounding in-flight requests to
    /// `listener.max_connections`.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(homepage_redirect))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(std::time::Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(GlobalConcurrencyLimitLayer::new(
                config.listener.max_connections,
            ))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(RequestIdLayer)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            unrestricted = self.config.is_unrestricted(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutdown signal received");
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown triggered");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// The root path serves no content; send callers to the static homepage
/// with a plain 302.
async fn homepage_redirect() -> Response {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(axum::http::header::LOCATION, "/index.html")
        .body(Body::empty())
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

/// Main proxy handler. Catches anything unexpected and reduces it to a
/// generic 500 so no internal detail leaks.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    match handle_proxy(&state, request).await {
        Ok(response) => response,
        Err(PipelineError::RequestBodyTooLarge) => {
            error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
        }
        Err(error) => {
            tracing::error!(request_id = %request_id, error = %error, "Pipeline failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

async fn handle_proxy(
    state: &AppState,
    request: Request<Body>,
) -> Result<Response, PipelineError> {
    let config = &state.config;

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let path = request.uri().path().to_string();
    let target_url = format!("{}{}", UPSTREAM_ORIGIN, path_and_query);

    tracing::debug!(
        method = %request.method(),
        path = %path,
        target = %target_url,
        "Proxying request"
    );

    // Unrestricted configs skip policy evaluation entirely.
    if config.is_unrestricted() {
        return forward_fast(state, request, target_url).await;
    }

    let referer = request
        .headers()
        .get(axum::http::header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Err(rejection) = policy::evaluate(&path, referer.as_deref(), config) {
        tracing::info!(
            path = %path,
            status = %rejection.status,
            "Request rejected by policy"
        );
        return Ok(rejection_response(rejection));
    }

    let outbound_headers = headers::outbound_full(request.headers());
    let upstream_response =
        forward(state, request, target_url, outbound_headers).await?;

    if !upstream_response.status.is_success() {
        return Ok(mirror_upstream_error(&upstream_response));
    }

    // Size enforcement, full path only. A declared length is trusted; an
    // absent one forces a full read so the limit can still be applied.
    if let Some(max_bytes) = config.max_file_size_bytes() {
        match upstream_response.content_length() {
            Some(declared) if declared > max_bytes => {
                return Ok(size_limit_response(config));
            }
            Some(_) => {}
            None => {
                let response_headers =
                    headers::inbound_full(&upstream_response.headers, config.cache_max_age_secs);
                let status = upstream_response.status;
                let body = upstream_response.body.buffer().await?;
                if body.len() as u64 > max_bytes {
                    return Ok(size_limit_response(config));
                }
                return Ok(build_response(status, response_headers, Body::from(body)));
            }
        }
    }

    let response_headers =
        headers::inbound_full(&upstream_response.headers, config.cache_max_age_secs);
    Ok(build_response(
        upstream_response.status,
        response_headers,
        upstream_response.body.into_body(),
    ))
}

/// Abbreviated forward used only when no restriction is configured.
async fn forward_fast(
    state: &AppState,
    request: Request<Body>,
    target_url: String,
) -> Result<Response, PipelineError> {
    let outbound_headers = headers::outbound_fast(request.headers());
    let upstream_response = forward(state, request, target_url, outbound_headers).await?;

    if !upstream_response.status.is_success() {
        return Ok(mirror_upstream_error(&upstream_response));
    }

    let response_headers =
        headers::inbound_fast(&upstream_response.headers, state.config.cache_max_age_secs);
    Ok(build_response(
        upstream_response.status,
        response_headers,
        upstream_response.body.into_body(),
    ))
}

/// Issue the outbound request through the transport seam.
///
/// GET and HEAD never carry a body upstream; other methods forward theirs,
/// buffered up to [`MAX_REQUEST_BODY_BYTES`].
async fn forward(
    state: &AppState,
    request: Request<Body>,
    target_url: String,
    outbound_headers: axum::http::HeaderMap,
) -> Result<UpstreamResponse, PipelineError> {
    let method = request.method().clone();
    let body = if method == Method::GET || method == Method::HEAD {
        None
    } else {
        let declared = request
            .headers()
            .get(axum::http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared.is_some_and(|len| len > MAX_REQUEST_BODY_BYTES) {
            return Err(PipelineError::RequestBodyTooLarge);
        }
        let bytes = axum::body::to_bytes(request.into_body(), MAX_REQUEST_BODY_BYTES)
            .await
            .map_err(PipelineError::RequestBody)?;
        Some(bytes)
    };

    let upstream_request = UpstreamRequest {
        method,
        url: target_url,
        headers: outbound_headers,
        body,
    };

    Ok(state.upstream.fetch(upstream_request).await?)
}

fn mirror_upstream_error(upstream_response: &UpstreamResponse) -> Response {
    error_response(
        upstream_response.status,
        format!("Upstream server error: {}", upstream_response.status.as_u16()),
    )
}

fn size_limit_response(config: &ProxyConfig) -> Response {
    error_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        format!(
            "File exceeds the {}MB limit, contact {}",
            config.max_file_size_mb, config.contact
        ),
    )
}

fn build_response(
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Body,
) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response.into_response()
}
