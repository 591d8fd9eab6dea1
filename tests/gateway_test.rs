mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{
    ED25519_PRIVATE_PEM, ED25519_PUBLIC_PEM, INFO_UPSTREAM, SECRET, TestGateway, identity,
    spawn_echo_backend, token_with, valid_token,
};
use smp_gateway::middleware::gateway::query::QueryParams;
use smp_gateway::middleware::gateway::responder::JSON_UTF8;
use smp_gateway::services::auth::issuer::{CredentialIssuer, SigningKey};
use smp_gateway::services::auth::{FailureKind, VerificationKey};

const MISSING_BODY: &[u8] = br#"{"code": 401,"msg": "please log in first","data": ""}"#;

fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(v) = authorization {
        builder = builder.header(header::AUTHORIZATION, v);
    }
    builder.body(Body::empty()).unwrap()
}

fn forwarded_query(url: &str) -> QueryParams {
    QueryParams::parse(url.split_once('?').map(|(_, q)| q))
}

#[tokio::test]
async fn test_absent_header_is_401_with_fixed_body() {
    let gw = TestGateway::new(&[]);

    let (status, content_type, body) = gw.send(get("/info/apartment", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(content_type.as_deref(), Some(JSON_UTF8));
    assert_eq!(body, MISSING_BODY);
    assert!(gw.upstream.requests().is_empty());
}

#[tokio::test]
async fn test_blank_header_is_401_with_fixed_body() {
    let gw = TestGateway::new(&[]);

    for blank in ["", " ", "\t  "] {
        let (status, _, body) = gw.send(get("/info/apartment", Some(blank))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, MISSING_BODY);
    }
    assert!(gw.upstream.requests().is_empty());
}

#[tokio::test]
async fn test_valid_credential_forwards_exactly_identity_params() {
    let gw = TestGateway::new(&[]);
    let auth = format!("Bearer {}", valid_token());

    let (status, _, body) = gw
        .send(get(
            "/info/apartment?email=evil%40x.com&roleId=0&roleId=9&page=3",
            Some(&auth),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"backend");

    let requests = gw.upstream.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.starts_with(&format!("{INFO_UPSTREAM}/apartment?")));

    let query = forwarded_query(&requests[0].url);
    let keys: Vec<_> = query.keys().collect();
    assert_eq!(keys, vec!["email", "name", "roleId", "tel", "username"]);
    assert_eq!(query.get("email"), Some(&["a@b.com".to_string()][..]));
    assert_eq!(query.get("name"), Some(&["A".to_string()][..]));
    assert_eq!(query.get("tel"), Some(&["123".to_string()][..]));
    assert_eq!(query.get("username"), Some(&["a".to_string()][..]));
    assert_eq!(query.get("roleId"), Some(&["1".to_string()][..]));
}

#[tokio::test]
async fn test_backend_never_receives_credential_headers() {
    let backend = spawn_echo_backend().await;
    let gw = TestGateway::over_http(&backend, &[]);
    let req = Request::builder()
        .uri("/info/apartment?roleId=0")
        .header(header::AUTHORIZATION, format!("Bearer {}", valid_token()))
        .header(header::COOKIE, "SESSION=abc")
        .header("x-trace", "t-1")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = gw.send(req).await;

    assert_eq!(status, StatusCode::OK);
    let echo: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        echo["uri"],
        "/apartment?email=a%40b.com&name=A&roleId=1&tel=123&username=a"
    );
    let headers: Vec<&str> = echo["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h.as_str().unwrap())
        .collect();
    assert!(headers.contains(&"x-trace"));
    assert!(!headers.contains(&"authorization"));
    assert!(!headers.contains(&"cookie"));
}

#[tokio::test]
async fn test_same_credential_twice_yields_same_params() {
    let gw = TestGateway::new(&[]);
    let auth = valid_token();

    gw.send(get("/info/room", Some(&auth))).await;
    gw.send(get("/info/room", Some(&auth))).await;

    let requests = gw.upstream.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        forwarded_query(&requests[0].url),
        forwarded_query(&requests[1].url)
    );
}

#[tokio::test]
async fn test_invalid_credentials_never_reach_backend() {
    let gw = TestGateway::new(&[]);
    let expired = token_with(SECRET, -3600, &identity());
    let foreign = token_with(b"another-service-secret", 3600, &identity());

    let cases = [
        ("Bearer not.a.jwt".to_string(), FailureKind::Malformed),
        (format!("Bearer {expired}"), FailureKind::Expired),
        (format!("Bearer {foreign}"), FailureKind::InvalidSignature),
    ];

    for (auth, kind) in cases {
        let (status, content_type, body) = gw.send(get("/info/apartment", Some(&auth))).await;

        assert_eq!(status, kind.status(), "{kind:?}");
        assert_eq!(content_type.as_deref(), Some(JSON_UTF8));
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["code"], status.as_u16());
        assert_eq!(body["msg"], kind.message());
        assert_eq!(body["data"], "");
    }
    assert!(gw.upstream.requests().is_empty());
}

#[tokio::test]
async fn test_invalid_signature_scenario_body() {
    let gw = TestGateway::new(&[]);
    let foreign = token_with(b"another-service-secret", 3600, &identity());

    let (status, _, body) = gw
        .send(get("/info/apartment", Some(&format!("Bearer {foreign}"))))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        br#"{"code": 401,"msg": "credential signature is invalid","data": ""}"#
    );
}

#[tokio::test]
async fn test_incomplete_claims_are_rejected() {
    let gw = TestGateway::new(&[]);
    let mut partial = identity();
    partial.role_id = String::new();
    let token = token_with(SECRET, 3600, &partial);

    let (status, _, body) = gw.send(get("/info/apartment", Some(&token))).await;

    assert_eq!(status, FailureKind::IncompleteClaims.status());
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["msg"], FailureKind::IncompleteClaims.message());
    assert!(gw.upstream.requests().is_empty());
}

#[tokio::test]
async fn test_exempt_prefix_bypasses_verification() {
    let gw = TestGateway::new(&["/public"]);

    for auth in [None, Some("Bearer garbage")] {
        let (status, _, _) = gw.send(get("/public/health?probe=1", auth)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let requests = gw.upstream.requests();
    assert_eq!(requests.len(), 2);
    for req in requests {
        assert_eq!(req.url, format!("{INFO_UPSTREAM}/health?probe=1"));
    }
}

#[tokio::test]
async fn test_exemption_does_not_leak_to_other_paths() {
    let gw = TestGateway::new(&["/public"]);

    let (status, _, body) = gw.send(get("/info/apartment", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, MISSING_BODY);
}

#[tokio::test]
async fn test_dot_segments_cannot_escape_exempt_prefix() {
    let gw = TestGateway::new(&["/public"]);

    for uri in [
        "/public/../info/apartment?username=admin&roleId=0",
        "/public/%2e%2e/info/apartment?username=admin&roleId=0",
        "/public/./../info/apartment?username=admin&roleId=0",
        "/public//..//info/apartment?username=admin&roleId=0",
    ] {
        let (status, _, body) = gw.send(get(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body, MISSING_BODY, "{uri}");
    }
    assert!(gw.upstream.requests().is_empty());
}

#[tokio::test]
async fn test_dot_segments_are_resolved_before_forwarding() {
    let gw = TestGateway::new(&["/public"]);

    let (status, _, _) = gw.send(get("/info/../public/./health?probe=1", None)).await;

    assert_eq!(status, StatusCode::OK);
    let requests = gw.upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, format!("{INFO_UPSTREAM}/health?probe=1"));
}

#[tokio::test]
async fn test_encoded_separators_are_rejected() {
    let gw = TestGateway::new(&["/public"]);

    for uri in ["/public/..%2Finfo/apartment", "/public/..%5cinfo/apartment"] {
        let (status, _, body) = gw.send(get(uri, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            body,
            br#"{"code": 400,"msg": "invalid request path","data": ""}"#
        );
    }
    assert!(gw.upstream.requests().is_empty());
}

#[tokio::test]
async fn test_ed25519_public_key_verification() {
    let gw = TestGateway::with_key(
        &VerificationKey::Ed25519Pem(ED25519_PUBLIC_PEM.to_string()),
        &[],
    );
    let token = CredentialIssuer::new(
        &SigningKey::Ed25519Pem(ED25519_PRIVATE_PEM.to_string()),
        None,
        3600,
    )
    .unwrap()
    .issue(&identity())
    .unwrap();

    let (status, _, _) = gw
        .send(get("/info/apartment", Some(&format!("Bearer {token}"))))
        .await;
    assert_eq!(status, StatusCode::OK);

    // An HS256 credential must not pass an EdDSA verifier.
    let (status, _, _) = gw
        .send(get("/info/apartment", Some(&valid_token())))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(gw.upstream.requests().len(), 1);
}
