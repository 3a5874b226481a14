//! Shared utilities for integration testing.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use futures_util::future::BoxFuture;
use futures_util::stream;
use tokio::net::TcpListener;

use cdn_proxy::config::ProxyConfig;
use cdn_proxy::http::HttpServer;
use cdn_proxy::lifecycle::Shutdown;
use cdn_proxy::upstream::{
    UpstreamBody, UpstreamClient, UpstreamError, UpstreamRequest, UpstreamResponse,
};

/// The request the proxy forwarded through the transport seam, as the
/// mock observed it.
#[derive(Debug, Clone)]
#[allow(dead_code)] // not every test binary reads every field
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Response the mock will serve, chunked so streaming paths are exercised.
#[derive(Clone)]
pub struct ScriptedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub chunks: Vec<Bytes>,
}

impl ScriptedResponse {
    pub fn ok(body: &[u8]) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            chunks: vec![Bytes::copy_from_slice(body)],
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.insert(name, value.parse().unwrap());
        self
    }

    pub fn with_chunks(mut self, chunks: Vec<Bytes>) -> Self {
        self.chunks = chunks;
        self
    }
}

/// Scripted stand-in for the upstream origin. Records every forwarded
/// request and replays the configured response. A gated mock additionally
/// holds each response until the test releases a permit.
#[derive(Clone)]
pub struct MockUpstream {
    response: Arc<Mutex<ScriptedResponse>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    gate: Option<Arc<tokio::sync::Semaphore>>,
}

impl MockUpstream {
    pub fn new(response: ScriptedResponse) -> Self {
        Self {
            response: Arc::new(Mutex::new(response)),
            requests: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// Like [`MockUpstream::new`], but every fetch consumes one permit from
    /// the returned semaphore before responding (starts with zero permits).
    #[allow(dead_code)]
    pub fn gated(response: ScriptedResponse) -> (Self, Arc<tokio::sync::Semaphore>) {
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let mut mock = Self::new(response);
        mock.gate = Some(gate.clone());
        (mock, gate)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl UpstreamClient for MockUpstream {
    fn fetch(
        &self,
        request: UpstreamRequest,
    ) -> BoxFuture<'static, Result<UpstreamResponse, UpstreamError>> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });

        let scripted = self.response.lock().unwrap().clone();
        let gate = self.gate.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                let permit = gate.acquire_owned().await.unwrap();
                permit.forget();
            }
            let chunks: Vec<Result<Bytes, UpstreamError>> =
                scripted.chunks.into_iter().map(Ok).collect();
            Ok(UpstreamResponse {
                status: scripted.status,
                headers: scripted.headers,
                body: UpstreamBody::Stream(Box::pin(stream::iter(chunks))),
            })
        })
    }
}

/// Start the proxy on an ephemeral local port with the given config and
/// mock transport. Returns the base URL and the shutdown handle keeping
/// the server alive.
pub async fn start_proxy(config: ProxyConfig, upstream: MockUpstream) -> (String, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::with_upstream(config, Arc::new(upstream));
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (format!("http://{}", addr), shutdown)
}

/// Client without pooling or proxying, for deterministic test requests.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
