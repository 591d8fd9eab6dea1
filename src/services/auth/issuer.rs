//! Credential issuing, the counterpart of [`super::credential::CredentialVerifier`].
//!
//! The gateway itself never issues credentials; this exists for local tooling
//! (`token-gen`) and tests.
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("invalid signing key: {0}")]
    Key(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign credential: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub enum SigningKey {
    Secret(Vec<u8>),
    /// Ed25519 private key in PKCS#8 PEM format.
    Ed25519Pem(String),
}

/// Identity to embed in a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub email: String,
    pub name: String,
    pub tel: String,
    pub username: String,
    pub role_id: String,
}

#[derive(Debug, Serialize)]
struct TokenClaims<'a> {
    email: &'a str,
    name: &'a str,
    tel: &'a str,
    username: &'a str,
    role: RoleClaim<'a>,
    iat: i64,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    iss: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RoleClaim<'a> {
    id: &'a str,
}

#[derive(Clone)]
pub struct CredentialIssuer {
    encoding_key: EncodingKey,
    algorithm: Algorithm,
    issuer: Option<String>,
    ttl_seconds: i64,
}

impl CredentialIssuer {
    /// `ttl_seconds` may be negative to mint an already-expired credential.
    pub fn new(
        key: &SigningKey,
        issuer: Option<String>,
        ttl_seconds: i64,
    ) -> Result<Self, IssueError> {
        let (encoding_key, algorithm) = match key {
            SigningKey::Secret(secret) => (EncodingKey::from_secret(secret), Algorithm::HS256),
            SigningKey::Ed25519Pem(pem) => (
                EncodingKey::from_ed_pem(pem.as_bytes()).map_err(IssueError::Key)?,
                Algorithm::EdDSA,
            ),
        };

        Ok(Self {
            encoding_key,
            algorithm,
            issuer,
            ttl_seconds,
        })
    }

    pub fn issue(&self, identity: &IdentityClaims) -> Result<String, IssueError> {
        let now = chrono::Utc::now().timestamp();

        let claims = TokenClaims {
            email: &identity.email,
            name: &identity.name,
            tel: &identity.tel,
            username: &identity.username,
            role: RoleClaim {
                id: &identity.role_id,
            },
            iat: now,
            exp: now + self.ttl_seconds,
            iss: self.issuer.as_deref(),
        };

        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(IssueError::Sign)
    }
}
