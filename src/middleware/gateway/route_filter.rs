//! Route decoration: map the request path to a backend.
//!
//! Longest matching prefix wins; the prefix is stripped before forwarding
//! (`/info/apartment` on route `/info` goes to `<upstream>/apartment`).
use axum::http::StatusCode;

use super::context::{RequestContext, RouteTarget};
use super::filter::{
    Decision, FilterError, PreFilter, ROUTE_DECORATION_ORDER, Termination, short_circuit,
};
use super::responder::ResponseSink;

pub const NO_ROUTE_MSG: &str = "no route for path";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub prefix: String,
    pub upstream: String,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(mut routes: Vec<Route>) -> Self {
        for r in &mut routes {
            let trimmed = r.prefix.trim_end_matches('/');
            r.prefix = if trimmed.is_empty() {
                String::new()
            } else {
                trimmed.to_string()
            };
            r.upstream = r.upstream.trim_end_matches('/').to_string();
        }
        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { routes }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn resolve(&self, path: &str) -> Option<RouteTarget> {
        self.routes.iter().find_map(|r| {
            let rest = path.strip_prefix(r.prefix.as_str())?;
            if !(rest.is_empty() || rest.starts_with('/')) {
                return None;
            }
            let path = if rest.is_empty() { "/" } else { rest };
            Some(RouteTarget {
                upstream: r.upstream.clone(),
                path: path.to_string(),
            })
        })
    }
}

#[derive(Debug, Clone)]
pub struct RouteFilter {
    table: RouteTable,
}

impl RouteFilter {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }
}

impl PreFilter for RouteFilter {
    fn name(&self) -> &'static str {
        "route-decoration"
    }

    fn order(&self) -> i32 {
        ROUTE_DECORATION_ORDER
    }

    fn should_run(&self, _ctx: &RequestContext) -> bool {
        true
    }

    fn run(
        &self,
        ctx: &mut RequestContext,
        sink: &mut dyn ResponseSink,
    ) -> Result<Decision, FilterError> {
        match self.table.resolve(ctx.path()) {
            Some(target) => {
                ctx.set_route(target);
                Ok(Decision::Proceed)
            }
            None => short_circuit(
                ctx,
                sink,
                Termination::new(StatusCode::NOT_FOUND, NO_ROUTE_MSG),
            ),
        }
    }
}
