//! Per-request gateway context, passed by `&mut` through every pre-filter.
//!
//! Owned by exactly one request. The `terminated` flag is one-way: once set,
//! no later stage runs and the request is never forwarded.
use axum::http::{HeaderMap, HeaderValue, Method, Uri, header};
use thiserror::Error;

use super::query::QueryParams;

/// The request path cannot be mapped to a single canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid request path: {0}")]
pub struct InvalidPath(pub String);

/// Canonical form of a request path, the one every stage matches on.
///
/// `.` and `..` segments (plain or `%2e`-encoded) are resolved and repeated
/// slashes collapse, the same way the backend's URL parser would treat them.
/// `..` never climbs above the root. Backslashes and encoded separators
/// (`%2f`, `%5c`) are rejected: backends disagree on how to split them.
pub fn normalize_path(raw: &str) -> Result<String, InvalidPath> {
    let lower = raw.to_ascii_lowercase();
    if raw.contains('\\') || lower.contains("%2f") || lower.contains("%5c") {
        return Err(InvalidPath(raw.to_string()));
    }

    let mut segments: Vec<&str> = Vec::new();
    let mut trailing_slash = false;
    for segment in raw.split('/') {
        trailing_slash = true;
        match segment.to_ascii_lowercase().replace("%2e", ".").as_str() {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => {
                segments.push(segment);
                trailing_slash = false;
            }
        }
    }

    let mut path = String::with_capacity(raw.len());
    for segment in &segments {
        path.push('/');
        path.push_str(segment);
    }
    if path.is_empty() || trailing_slash {
        path.push('/');
    }
    Ok(path)
}

/// Resolved backend for the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    /// Base URL of the backend, e.g. `http://smp-info:8080`.
    pub upstream: String,
    /// Path to request on the backend (route prefix already stripped).
    pub path: String,
}

#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: QueryParams,
    route: Option<RouteTarget>,
    terminated: bool,
}

impl RequestContext {
    /// Build the context from the inbound request line. The path is
    /// normalized here, before any exemption or route lookup sees it.
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap) -> Result<Self, InvalidPath> {
        Ok(Self {
            method,
            path: normalize_path(uri.path())?,
            headers,
            query: QueryParams::parse(uri.query()),
            route: None,
            terminated: false,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn authorization(&self) -> Option<&HeaderValue> {
        self.headers.get(header::AUTHORIZATION)
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Replace the whole outgoing query parameter set.
    pub fn replace_query(&mut self, query: QueryParams) {
        self.query = query;
    }

    pub fn route(&self) -> Option<&RouteTarget> {
        self.route.as_ref()
    }

    pub fn set_route(&mut self, route: RouteTarget) {
        self.route = Some(route);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    /// Hand the forwarding-relevant parts to the dispatch stage.
    pub fn into_parts(self) -> (Method, HeaderMap, QueryParams, Option<RouteTarget>) {
        (self.method, self.headers, self.query, self.route)
    }
}
