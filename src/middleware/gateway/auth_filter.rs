//! `Authorization` header check, run right before route decoration.
//!
//! Verifies the credential and replaces the outgoing query parameters with the
//! caller's identity. Backends trust only these gateway-injected parameters,
//! so client-supplied values are dropped, never merged.
use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};

use super::context::RequestContext;
use super::filter::{
    Decision, FilterError, PreFilter, ROUTE_DECORATION_ORDER, Termination, short_circuit,
};
use super::responder::ResponseSink;
use crate::services::auth::{CredentialFailure, CredentialVerifier, FailureKind, IdentityParams};

pub const MISSING_CREDENTIAL_MSG: &str = "please log in first";

/// Path prefixes exempt from authentication. Empty means nothing is exempt.
#[derive(Debug, Clone, Default)]
pub struct IgnorePaths(Vec<String>);

impl IgnorePaths {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self(prefixes)
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.0.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationFilter {
    verifier: Arc<CredentialVerifier>,
    ignore: IgnorePaths,
}

impl AuthorizationFilter {
    pub fn new(verifier: Arc<CredentialVerifier>, ignore: IgnorePaths) -> Self {
        Self { verifier, ignore }
    }

    pub fn should_run_for(&self, path: &str) -> bool {
        !self.ignore.is_exempt(path)
    }

    pub fn apply(
        &self,
        ctx: &mut RequestContext,
        sink: &mut dyn ResponseSink,
    ) -> Result<Decision, FilterError> {
        if !self.should_run_for(ctx.path()) {
            tracing::debug!(path = ctx.path(), "path exempt from authentication");
            return Ok(Decision::Proceed);
        }

        let Some(header) = ctx.authorization().filter(|v| !is_blank(v)) else {
            tracing::debug!(path = ctx.path(), "request without credential");
            return short_circuit(
                ctx,
                sink,
                Termination::new(StatusCode::UNAUTHORIZED, MISSING_CREDENTIAL_MSG),
            );
        };

        let verified = match header.to_str() {
            Ok(value) => self.verifier.verify(value),
            Err(_) => Err(CredentialFailure::from(FailureKind::Malformed)),
        };

        match verified {
            Ok(claims) => {
                ctx.replace_query(IdentityParams::from(&claims).into());
                Ok(Decision::Proceed)
            }
            Err(failure) => {
                tracing::warn!(
                    kind = ?failure.kind,
                    status = failure.status.as_u16(),
                    path = ctx.path(),
                    "credential verification failed"
                );
                short_circuit(
                    ctx,
                    sink,
                    Termination::new(failure.status, failure.message),
                )
            }
        }
    }
}

fn is_blank(value: &HeaderValue) -> bool {
    value.as_bytes().iter().all(u8::is_ascii_whitespace)
}

impl PreFilter for AuthorizationFilter {
    fn name(&self) -> &'static str {
        "authorization"
    }

    fn order(&self) -> i32 {
        ROUTE_DECORATION_ORDER - 1
    }

    fn should_run(&self, ctx: &RequestContext) -> bool {
        self.should_run_for(ctx.path())
    }

    fn run(
        &self,
        ctx: &mut RequestContext,
        sink: &mut dyn ResponseSink,
    ) -> Result<Decision, FilterError> {
        self.apply(ctx, sink)
    }
}
