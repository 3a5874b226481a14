//! reqwest-backed upstream client.

use futures_util::future::BoxFuture;
use futures_util::TryStreamExt;

use crate::upstream::{
    UpstreamBody, UpstreamClient, UpstreamError, UpstreamRequest, UpstreamResponse,
};

/// Production transport: a shared `reqwest::Client` handling TLS,
/// connection pooling, and redirects for the upstream origin.
#[derive(Clone, Default)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl UpstreamClient for ReqwestUpstream {
    fn fetch(
        &self,
        request: UpstreamRequest,
    ) -> BoxFuture<'static, Result<UpstreamResponse, UpstreamError>> {
        let client = self.client.clone();

        Box::pin(async move {
            let mut builder = client
                .request(request.method, request.url)
                .headers(request.headers);

            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;

            let status = response.status();
            let headers = response.headers().clone();
            let stream = response.bytes_stream().map_err(UpstreamError::Transport);

            Ok(UpstreamResponse {
                status,
                headers,
                body: UpstreamBody::Stream(Box::pin(stream)),
            })
        })
    }
}
