/*
 * Responsibility
 * - Forward an authenticated request to its backend and relay the response
 * - Backends (info / room services) are external; only this trait is visible
 *   to the gateway handler, so tests can swap in a recording double
 */
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, header},
    response::Response,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Absolute URL including the rewritten query string.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[async_trait]
pub trait Upstream: Send + Sync {
    async fn forward(&self, req: ForwardRequest) -> Result<Response, UpstreamError>;
}

/// Headers never copied from client to backend: hop-by-hop headers, plus the
/// credential headers the gateway has already consumed.
const SKIPPED_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "content-length",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "authorization",
    "cookie",
    "set-cookie",
];

fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(k, _)| !SKIPPED_HEADERS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn forward(&self, req: ForwardRequest) -> Result<Response, UpstreamError> {
        let mut outgoing = self
            .client
            .request(req.method, &req.url)
            .headers(forwardable_headers(&req.headers));
        if !req.body.is_empty() {
            outgoing = outgoing.body(req.body);
        }

        let res = outgoing.send().await?;

        let mut builder = Response::builder().status(res.status());
        for (k, v) in res.headers() {
            if k == header::TRANSFER_ENCODING || k == header::CONNECTION {
                continue;
            }
            builder = builder.header(k, v);
        }
        let body = res.bytes().await?;

        Ok(builder.body(Body::from(body))?)
    }
}
