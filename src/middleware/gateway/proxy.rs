//! Gateway entrypoint: every inbound request lands here.
//!
//! Runs the pre-filter chain against an explicit [`RequestContext`], then
//! either returns the short-circuit response or forwards the (rewritten)
//! request. Exactly one of the two happens per request.
use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};

use super::context::RequestContext;
use super::filter::Decision;
use super::responder::ResponseBuffer;
use crate::error::AppError;
use crate::services::upstream::ForwardRequest;
use crate::state::AppState;

pub async fn forward(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();
    let mut ctx = RequestContext::new(parts.method, &parts.uri, parts.headers).map_err(|e| {
        tracing::warn!(error = %e, "rejected request path");
        AppError::BadRequest("invalid request path")
    })?;
    let mut sink = ResponseBuffer::new();

    let decision = state.filters.run(&mut ctx, &mut sink).map_err(|e| {
        tracing::error!(error = %e, path = ctx.path(), "pre-filter failed");
        AppError::Internal
    })?;

    if matches!(decision, Decision::Terminate(_)) || ctx.is_terminated() {
        return Ok(sink.into_response());
    }

    let (method, headers, query, route) = ctx.into_parts();
    let route = route.ok_or(AppError::NotFound)?;

    // Buffered through the `Bytes` extractor so an exceeded body limit keeps its 413.
    let body = Bytes::from_request(Request::new(body), &())
        .await
        .map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge
            } else {
                AppError::BadRequest("failed to read request body")
            }
        })?;

    let mut url = format!("{}{}", route.upstream, route.path);
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query.to_query_string());
    }

    let upstream = route.upstream;
    state
        .upstream
        .forward(ForwardRequest {
            method,
            url,
            headers,
            body,
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, upstream = %upstream, "failed to forward request");
            AppError::BadGateway
        })
}
