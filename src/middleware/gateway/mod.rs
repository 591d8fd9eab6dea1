/*!
 * Gateway pre-routing pipeline
 *
 * Order of stages for every inbound request:
 * 1. authorization   (auth_filter)  - verify credential, inject identity
 * 2. route-decoration (route_filter) - resolve backend
 * 3. dispatch        (proxy)        - forward, only if nothing terminated
 */
pub mod auth_filter;
pub mod context;
pub mod filter;
pub mod proxy;
pub mod query;
pub mod responder;
pub mod route_filter;

pub use auth_filter::{AuthorizationFilter, IgnorePaths};
pub use context::RequestContext;
pub use filter::{Decision, FilterChain, FilterError, PreFilter, Termination};
pub use route_filter::{RouteFilter, RouteTable};
