/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - filter chain (verifier key inside, read-only after startup)
 *   - backend dispatch client
 * - Cheap to clone (Arc inside); never mutated per request
 */
use std::sync::Arc;

use crate::middleware::gateway::filter::FilterChain;
use crate::services::upstream::Upstream;

#[derive(Clone)]
pub struct AppState {
    pub filters: Arc<FilterChain>,
    pub upstream: Arc<dyn Upstream>,
}

impl AppState {
    pub fn new(filters: FilterChain, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            filters: Arc::new(filters),
            upstream,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}
