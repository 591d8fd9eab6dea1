/// Factory: build `CredentialVerifier` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::CredentialVerifier;

pub fn build_verifier(config: &Config) -> Result<Arc<CredentialVerifier>, AppError> {
    let verifier = CredentialVerifier::new(
        &config.verification_key,
        config.jwt_issuer.as_deref(),
        config.jwt_leeway_seconds,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "failed to load credential verification key");
        AppError::Internal
    })?;

    Ok(Arc::new(verifier))
}
