//! Credential verification: `Authorization` header value -> verified [`Claims`].
//!
//! - Signature and `exp` are checked by `jsonwebtoken::Validation`.
//! - Identity fields are checked here (all must be present and non-blank).
//! - Key material is loaded once at startup and never mutated afterwards.

use axum::http::StatusCode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

/// Why a presented credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Malformed,
    InvalidSignature,
    Expired,
    IncompleteClaims,
}

impl FailureKind {
    /// HTTP status the gateway answers with for this kind.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Malformed
            | Self::InvalidSignature
            | Self::Expired
            | Self::IncompleteClaims => StatusCode::UNAUTHORIZED,
        }
    }

    /// Caller-visible message written into the error envelope.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Malformed => "credential is malformed",
            Self::InvalidSignature => "credential signature is invalid",
            Self::Expired => "login has expired, please log in again",
            Self::IncompleteClaims => "credential is missing identity claims",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({kind:?})")]
pub struct CredentialFailure {
    pub kind: FailureKind,
    pub status: StatusCode,
    pub message: &'static str,
}

impl From<FailureKind> for CredentialFailure {
    fn from(kind: FailureKind) -> Self {
        Self {
            kind,
            status: kind.status(),
            message: kind.message(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for CredentialFailure {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        let kind = match e.kind() {
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => FailureKind::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidIssuer => FailureKind::InvalidSignature,
            ErrorKind::MissingRequiredClaim(_) => FailureKind::IncompleteClaims,
            _ => FailureKind::Malformed,
        };
        kind.into()
    }
}

/// Verified identity carried by a credential. Read-only once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    email: String,
    name: String,
    tel: String,
    username: String,
    role_id: String,
}

impl Claims {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tel(&self) -> &str {
        &self.tel
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role_id(&self) -> &str {
        &self.role_id
    }
}

/// JWT payload as signed by the login service.
///
/// Identity fields default to empty so that an absent field surfaces as
/// `IncompleteClaims` instead of a generic decode error.
#[derive(Debug, Clone, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    tel: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    role: Option<RoleClaim>,
}

#[derive(Debug, Clone, Deserialize)]
struct RoleClaim {
    #[serde(default)]
    id: Option<RoleId>,
}

/// Opaque role identifier; login services emit it as a string or a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RoleId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RoleId> for String {
    fn from(id: RoleId) -> Self {
        match id {
            RoleId::Text(s) => s,
            RoleId::Number(n) => n.to_string(),
        }
    }
}

impl TryFrom<TokenClaims> for Claims {
    type Error = CredentialFailure;

    fn try_from(c: TokenClaims) -> Result<Self, Self::Error> {
        let role_id: String = c
            .role
            .and_then(|r| r.id)
            .map(Into::into)
            .unwrap_or_default();

        let fields = [&c.email, &c.name, &c.tel, &c.username, &role_id];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(FailureKind::IncompleteClaims.into());
        }

        Ok(Claims {
            email: c.email,
            name: c.name,
            tel: c.tel,
            username: c.username,
            role_id,
        })
    }
}

/// Process-wide verification key.
#[derive(Clone)]
pub enum VerificationKey {
    /// HMAC shared secret (HS256).
    Secret(Vec<u8>),
    /// Ed25519 public key, PEM encoded (EdDSA).
    Ed25519Pem(String),
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        match self {
            Self::Secret(_) => f.write_str("Secret(..)"),
            Self::Ed25519Pem(_) => f.write_str("Ed25519Pem(..)"),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid verification key: {0}")]
pub struct KeyError(#[from] jsonwebtoken::errors::Error);

#[derive(Clone)]
pub struct CredentialVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl CredentialVerifier {
    pub fn new(
        key: &VerificationKey,
        issuer: Option<&str>,
        leeway_seconds: u64,
    ) -> Result<Self, KeyError> {
        let (decoding_key, algorithm) = match key {
            VerificationKey::Secret(secret) => (DecodingKey::from_secret(secret), Algorithm::HS256),
            VerificationKey::Ed25519Pem(pem) => {
                (DecodingKey::from_ed_pem(pem.as_bytes())?, Algorithm::EdDSA)
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        validation.leeway = leeway_seconds;
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Verify the raw `Authorization` header value.
    ///
    /// Accepts `Bearer <jwt>` (scheme is case-insensitive) or a bare `<jwt>`.
    /// Callers are expected to reject blank values before calling this.
    pub fn verify(&self, header_value: &str) -> Result<Claims, CredentialFailure> {
        let token = strip_bearer(header_value.trim());
        if token.is_empty() {
            return Err(FailureKind::Malformed.into());
        }

        let data =
            jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;

        let claims = Claims::try_from(data.claims)?;
        tracing::debug!(username = %claims.username, "credential verified");
        Ok(claims)
    }
}

fn strip_bearer(value: &str) -> &str {
    match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim_start(),
        _ => value,
    }
}
