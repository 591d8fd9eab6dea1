//! Ordered pre-routing filter chain.
//!
//! Stages run in ascending `order()`. The chain stops at the first stage that
//! terminates the context, so later stages (route decoration, dispatch) only
//! ever see requests that every earlier stage let through.
use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use super::context::RequestContext;
use super::responder::{ResponseSink, ResponseWriteFailure, write_envelope};

/// Order of the route decoration stage. Authentication runs right before it.
pub const ROUTE_DECORATION_ORDER: i32 = 5;

#[derive(Debug, Error)]
pub enum FilterError {
    /// The response channel broke while writing a short-circuit body.
    #[error(transparent)]
    ResponseWrite(#[from] ResponseWriteFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub status: StatusCode,
    pub code: u16,
    pub msg: String,
}

impl Termination {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            code: status.as_u16(),
            msg: msg.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Terminate(Termination),
}

pub trait PreFilter: Send + Sync {
    fn name(&self) -> &'static str;
    fn order(&self) -> i32;
    fn should_run(&self, ctx: &RequestContext) -> bool;
    fn run(
        &self,
        ctx: &mut RequestContext,
        sink: &mut dyn ResponseSink,
    ) -> Result<Decision, FilterError>;
}

/// Terminate the request: mark the context, then write the envelope.
///
/// The context is marked first so that a failed write can never lead to the
/// request being forwarded.
pub fn short_circuit(
    ctx: &mut RequestContext,
    sink: &mut dyn ResponseSink,
    termination: Termination,
) -> Result<Decision, FilterError> {
    ctx.terminate();
    write_envelope(sink, termination.status, termination.code, &termination.msg)?;
    Ok(Decision::Terminate(termination))
}

#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn PreFilter>>,
}

impl FilterChain {
    pub fn new(mut filters: Vec<Arc<dyn PreFilter>>) -> Self {
        filters.sort_by_key(|f| f.order());
        Self { filters }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn run(
        &self,
        ctx: &mut RequestContext,
        sink: &mut dyn ResponseSink,
    ) -> Result<Decision, FilterError> {
        for filter in &self.filters {
            if !filter.should_run(ctx) {
                tracing::debug!(filter = filter.name(), path = ctx.path(), "filter skipped");
                continue;
            }

            match filter.run(ctx, sink)? {
                Decision::Proceed => {}
                Decision::Terminate(t) => {
                    tracing::debug!(
                        filter = filter.name(),
                        status = t.status.as_u16(),
                        "request short-circuited"
                    );
                    // A stage returning Terminate without going through
                    // `short_circuit` still must not be forwarded.
                    ctx.terminate();
                    return Ok(Decision::Terminate(t));
                }
            }
        }
        Ok(Decision::Proceed)
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.names())
            .finish()
    }
}
