pub mod credential;
pub mod factory;
pub mod identity;
pub mod issuer;

pub use credential::{Claims, CredentialFailure, CredentialVerifier, FailureKind, VerificationKey};
pub use factory::build_verifier;
pub use identity::IdentityParams;
