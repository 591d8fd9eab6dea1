/*
 * Responsibility
 * - Config loading -> dependency construction -> Router assembly
 * - HTTP middleware (request id / trace / limits)
 * - axum::serve() startup
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::middleware::{
    self,
    gateway::{AuthorizationFilter, FilterChain, IgnorePaths, PreFilter, RouteFilter, RouteTable},
};
use crate::services::{auth::build_verifier, upstream::HttpUpstream};
use crate::state::AppState;

/// `RUST_LOG` wins; otherwise gateway decisions at info, proxy plumbing at warn.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,smp_gateway=info,tower_http=info,reqwest=warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Route panics through tracing so they land next to the request that caused them.
/// Outside production the process aborts after logging.
fn init_panic_hook(abort_on_panic: bool) {
    let previous = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();
        tracing::error!(%location, %message, "gateway panicked");

        if abort_on_panic {
            process::abort();
        }
        previous(info);
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        routes = config.routes.len(),
        ignored = ?config.ignore_paths,
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = middleware::http::apply(router(state), &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build process-level services once; they are read-only afterwards.
pub fn build_state(config: &Config) -> Result<AppState> {
    let verifier = build_verifier(config)?;

    let routes = RouteTable::new(config.routes.clone());
    if routes.is_empty() {
        tracing::warn!("GATEWAY_ROUTES is empty; authenticated requests will answer 404");
    }

    let filters: Vec<Arc<dyn PreFilter>> = vec![
        Arc::new(AuthorizationFilter::new(
            verifier,
            IgnorePaths::new(config.ignore_paths.clone()),
        )),
        Arc::new(RouteFilter::new(routes)),
    ];
    let chain = FilterChain::new(filters);
    tracing::debug!(stages = ?chain.names(), "pre-filter chain");

    let upstream = HttpUpstream::new(config.upstream_timeout)?;

    Ok(AppState::new(chain, Arc::new(upstream)))
}

/// Every path, every method goes through the gateway chain.
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(middleware::gateway::proxy::forward)
        .with_state(state)
}
