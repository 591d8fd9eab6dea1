//! Tower layers wrapped around the gateway, outside the filter chain.
//!
//! - `x-request-id`: generated when absent, echoed on the response, and
//!   forwarded to backends along with the other request headers
//! - access log span per request
//! - request body cap and overall deadline, both from `Config`

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::header::HeaderName;
use axum::response::{IntoResponse, Response};
use tower::timeout::{TimeoutLayer, error::Elapsed};
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::AppError;

pub const REQUEST_ID: &str = "x-request-id";

async fn layer_error(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        tracing::warn!("request exceeded the gateway deadline");
        AppError::Timeout.into_response()
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        AppError::Internal.into_response()
    }
}

pub fn apply(router: Router, config: &Config) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID);

    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(layer_error))
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
            .layer(TimeoutLayer::new(config.request_timeout)),
    )
}
