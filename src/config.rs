/*
 * Responsibility
 * - Load settings from the environment (.env honoured via dotenvy)
 * - Validate them once at startup (missing / invalid -> startup fails)
 * - Everything here is immutable for the lifetime of the process
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::middleware::gateway::route_filter::Route;
use crate::services::auth::VerificationKey;

/// Deployment flavour. Only decides whether a panic aborts the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    /// Anything that is not recognisably production runs as development.
    pub fn parse(raw: &str) -> Self {
        if matches!(raw.trim().to_ascii_lowercase().as_str(), "production" | "prod") {
            Self::Production
        } else {
            Self::Development
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Self::Production
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no verification key: set JWT_PUBLIC_KEY_PEM or JWT_SECRET")]
    MissingKey,
    #[error("{0} is set but empty")]
    Empty(&'static str),
    #[error("{key} has an unusable value {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("GATEWAY_ROUTES entry {entry:?}: {reason}")]
    Route { entry: String, reason: &'static str },
}

/// Optional variable parsed as `T`; unset means `default`, unparsable is an error.
fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub verification_key: VerificationKey,
    pub jwt_issuer: Option<String>,
    pub jwt_leeway_seconds: u64,

    pub ignore_paths: Vec<String>,
    pub routes: Vec<Route>,

    pub upstream_timeout: Duration,
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let addr = SocketAddr::from(([0, 0, 0, 0], env_or::<u16>("PORT", 8080)?));

        let app_env = AppEnv::parse(&std::env::var("APP_ENV").unwrap_or_default());

        let verification_key = verification_key(
            std::env::var("JWT_PUBLIC_KEY_PEM").ok(),
            std::env::var("JWT_SECRET").ok(),
        )?;

        let jwt_issuer = std::env::var("JWT_ISSUER")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let jwt_leeway_seconds = env_or::<u64>("JWT_LEEWAY_SECONDS", 0)?;

        let ignore_paths = parse_list(&std::env::var("GATEWAY_IGNORE_PATHS").unwrap_or_default());

        let routes = parse_routes(&std::env::var("GATEWAY_ROUTES").unwrap_or_default())?;

        let upstream_timeout = Duration::from_secs(env_or::<u64>("UPSTREAM_TIMEOUT_SECONDS", 30)?);

        Ok(Self {
            addr,
            app_env,
            verification_key,
            jwt_issuer,
            jwt_leeway_seconds,
            ignore_paths,
            routes,
            upstream_timeout,
            request_timeout: Duration::from_secs(60),
            body_limit_bytes: 1024 * 1024,
        })
    }
}

/// A public key wins over a shared secret when both are set.
/// PEM values may carry literal `\n` escapes (single-line env files).
pub fn verification_key(
    pem: Option<String>,
    secret: Option<String>,
) -> Result<VerificationKey, ConfigError> {
    match (pem, secret) {
        (Some(pem), _) if pem.trim().is_empty() => Err(ConfigError::Empty("JWT_PUBLIC_KEY_PEM")),
        (Some(pem), _) => Ok(VerificationKey::Ed25519Pem(pem.replace("\\n", "\n"))),
        (None, Some(secret)) if secret.is_empty() => Err(ConfigError::Empty("JWT_SECRET")),
        (None, Some(secret)) => Ok(VerificationKey::Secret(secret.into_bytes())),
        (None, None) => Err(ConfigError::MissingKey),
    }
}

/// Comma-separated list, entries trimmed, empties dropped.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `"/info=http://smp-info:8080,/room=http://smp-room:8080"`
pub fn parse_routes(raw: &str) -> Result<Vec<Route>, ConfigError> {
    parse_list(raw)
        .into_iter()
        .map(|entry| {
            let bad = |reason| ConfigError::Route {
                entry: entry.clone(),
                reason,
            };
            let (prefix, upstream) = entry
                .split_once('=')
                .ok_or_else(|| bad("expected prefix=url"))?;
            let (prefix, upstream) = (prefix.trim(), upstream.trim());
            if !prefix.starts_with('/') {
                return Err(bad("prefix must start with '/'"));
            }
            if url::Url::parse(upstream).is_err() {
                return Err(bad("upstream is not an absolute URL"));
            }
            Ok(Route {
                prefix: prefix.to_string(),
                upstream: upstream.to_string(),
            })
        })
        .collect()
}
