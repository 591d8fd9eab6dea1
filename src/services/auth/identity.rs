//! Identity projection: verified claims -> request parameters trusted downstream.
use std::collections::BTreeMap;

use super::credential::Claims;
use crate::middleware::gateway::query::QueryParams;

pub const EMAIL: &str = "email";
pub const NAME: &str = "name";
pub const TEL: &str = "tel";
pub const USERNAME: &str = "username";
pub const ROLE_ID: &str = "roleId";

/// Exactly five keys, one value each. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityParams(BTreeMap<&'static str, Vec<String>>);

impl IdentityParams {
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }
}

impl From<&Claims> for IdentityParams {
    fn from(claims: &Claims) -> Self {
        let params = BTreeMap::from([
            (EMAIL, vec![claims.email().to_string()]),
            (NAME, vec![claims.name().to_string()]),
            (TEL, vec![claims.tel().to_string()]),
            (USERNAME, vec![claims.username().to_string()]),
            (ROLE_ID, vec![claims.role_id().to_string()]),
        ]);
        Self(params)
    }
}

impl From<IdentityParams> for QueryParams {
    fn from(identity: IdentityParams) -> Self {
        identity
            .0
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::credential::{CredentialVerifier, VerificationKey};
    use crate::services::auth::issuer::{CredentialIssuer, IdentityClaims, SigningKey};

    fn claims() -> Claims {
        let key = b"identity-projection-test-secret".to_vec();
        let token = CredentialIssuer::new(&SigningKey::Secret(key.clone()), None, 60)
            .unwrap()
            .issue(&IdentityClaims {
                email: "a@b.com".to_string(),
                name: "A".to_string(),
                tel: "123".to_string(),
                username: "a".to_string(),
                role_id: "1".to_string(),
            })
            .unwrap();
        CredentialVerifier::new(&VerificationKey::Secret(key), None, 0)
            .unwrap()
            .verify(&token)
            .unwrap()
    }

    #[test]
    fn test_projection_has_exactly_five_single_valued_keys() {
        let params = IdentityParams::from(&claims());

        let query: QueryParams = params.clone().into();
        let keys: Vec<_> = query.keys().collect();
        assert_eq!(keys, vec!["email", "name", "roleId", "tel", "username"]);
        assert_eq!(params.get("email"), Some(&["a@b.com".to_string()][..]));
        assert_eq!(params.get("name"), Some(&["A".to_string()][..]));
        assert_eq!(params.get("tel"), Some(&["123".to_string()][..]));
        assert_eq!(params.get("username"), Some(&["a".to_string()][..]));
        assert_eq!(params.get("roleId"), Some(&["1".to_string()][..]));
    }

    #[test]
    fn test_projection_is_deterministic() {
        let c = claims();
        assert_eq!(IdentityParams::from(&c), IdentityParams::from(&c));
    }

    #[test]
    fn test_into_query_params() {
        let query: QueryParams = IdentityParams::from(&claims()).into();

        assert_eq!(query.len(), 5);
        assert_eq!(query.get("roleId"), Some(&["1".to_string()][..]));
    }
}
