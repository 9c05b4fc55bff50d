//! Server Configuration
//!
//! Everything is read from the environment (optionally seeded by `.env`).
//! Parsing goes through a lookup function so it can be tested without
//! touching the process environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail, ensure};
use auth::AuthConfig;
use auth::application::config::SameSite;
use axum::http::HeaderValue;
use base64::Engine;
use base64::engine::general_purpose;
use platform::jwt::parse_algorithm;

/// Upper bound for token lifetimes (ten years)
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

/// Process-level configuration
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Postgres URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub request_timeout: Duration,
    pub frontend_origins: Vec<HeaderValue>,
    pub auth: AuthConfig,
    pub jwt_private_key_file: String,
    pub jwt_public_key_file: String,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let defaults = AuthConfig::default();

        let algorithm = match get("AUTH_JWT_ALGORITHM") {
            Some(name) => parse_algorithm(&name).context("AUTH_JWT_ALGORITHM")?,
            None => defaults.algorithm,
        };

        let refresh_token_max_count: usize =
            parse_or(&get, "AUTH_REFRESH_TOKEN_MAX_COUNT", defaults.refresh_token_max_count)?;
        ensure!(
            refresh_token_max_count >= 1,
            "AUTH_REFRESH_TOKEN_MAX_COUNT must be at least 1"
        );

        let access_ttl: u64 = parse_or(
            &get,
            "AUTH_JWT_TIME_TO_LIVE_SECS",
            defaults.access_token_ttl.as_secs(),
        )?;
        let refresh_ttl: u64 = parse_or(
            &get,
            "AUTH_REFRESH_TOKEN_TIME_TO_LIVE_SECS",
            defaults.refresh_token_ttl.as_secs(),
        )?;
        ensure!(
            (1..=MAX_TTL_SECS).contains(&access_ttl),
            "AUTH_JWT_TIME_TO_LIVE_SECS must be between 1 and {MAX_TTL_SECS}"
        );
        ensure!(
            (1..=MAX_TTL_SECS).contains(&refresh_ttl),
            "AUTH_REFRESH_TOKEN_TIME_TO_LIVE_SECS must be between 1 and {MAX_TTL_SECS}"
        );

        let password_pepper = get("AUTH_PASSWORD_PEPPER")
            .map(|b64| general_purpose::STANDARD.decode(b64.trim()))
            .transpose()
            .context("AUTH_PASSWORD_PEPPER must be base64")?;

        let cookie_same_site = match get("AUTH_REFRESH_TOKEN_SAME_SITE").as_deref() {
            None => defaults.cookie_same_site,
            Some(v) if v.eq_ignore_ascii_case("strict") => SameSite::Strict,
            Some(v) if v.eq_ignore_ascii_case("lax") => SameSite::Lax,
            Some(v) if v.eq_ignore_ascii_case("none") => SameSite::None,
            Some(other) => bail!("AUTH_REFRESH_TOKEN_SAME_SITE: unknown policy {other}"),
        };

        let auth = AuthConfig {
            issuer: get("AUTH_JWT_ISSUER").unwrap_or(defaults.issuer),
            algorithm,
            access_token_ttl: Duration::from_secs(access_ttl),
            refresh_token_ttl: Duration::from_secs(refresh_ttl),
            refresh_token_max_count,
            refresh_cookie_name: get("AUTH_REFRESH_TOKEN_COOKIE")
                .unwrap_or(defaults.refresh_cookie_name),
            refresh_cookie_path: defaults.refresh_cookie_path,
            // Plain-HTTP cookies only in debug builds unless told otherwise
            cookie_secure: parse_or(&get, "AUTH_HTTPS", !cfg!(debug_assertions))?,
            cookie_same_site,
            password_pepper,
        };

        let frontend_origins = get("FRONTEND_ORIGINS")
            .unwrap_or_else(|| "http://localhost:40922,http://127.0.0.1:40922".to_string())
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();

        Ok(Self {
            bind_addr: parse_or(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 31113)))?,
            database_url: get("DATABASE_URL"),
            request_timeout: Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECS", 30)?),
            frontend_origins,
            auth,
            jwt_private_key_file: get("AUTH_JWT_PRIVATE_KEY_FILE")
                .context("AUTH_JWT_PRIVATE_KEY_FILE must be set")?,
            jwt_public_key_file: get("AUTH_JWT_PUBLIC_KEY_FILE")
                .context("AUTH_JWT_PUBLIC_KEY_FILE must be set")?,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::jwt::Algorithm;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    const KEYS: [(&str, &str); 2] = [
        ("AUTH_JWT_PRIVATE_KEY_FILE", "keys/private.pem"),
        ("AUTH_JWT_PUBLIC_KEY_FILE", "keys/public.pem"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&KEYS).unwrap();
        assert_eq!(config.auth.issuer, "customers-api");
        assert_eq!(config.auth.algorithm, Algorithm::EdDSA);
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(600));
        assert_eq!(config.auth.refresh_token_max_count, 5);
        assert!(config.database_url.is_none());
        assert_eq!(config.bind_addr.port(), 31113);
        assert_eq!(config.frontend_origins.len(), 2);
    }

    #[test]
    fn test_overrides() {
        let mut vars = KEYS.to_vec();
        vars.extend([
            ("AUTH_JWT_ISSUER", "issuer-x"),
            ("AUTH_JWT_ALGORITHM", "RS256"),
            ("AUTH_REFRESH_TOKEN_MAX_COUNT", "2"),
            ("AUTH_REFRESH_TOKEN_TIME_TO_LIVE_SECS", "3600"),
            ("AUTH_HTTPS", "true"),
            ("AUTH_PASSWORD_PEPPER", "cGVwcGVy"),
            ("DATABASE_URL", "postgres://localhost/app"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.auth.issuer, "issuer-x");
        assert_eq!(config.auth.algorithm, Algorithm::RS256);
        assert_eq!(config.auth.refresh_token_max_count, 2);
        assert_eq!(config.auth.refresh_token_ttl, Duration::from_secs(3600));
        assert!(config.auth.cookie_secure);
        assert_eq!(config.auth.pepper(), Some(&b"pepper"[..]));
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/app"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let with = |extra: (&'static str, &'static str)| {
            let mut vars = KEYS.to_vec();
            vars.push(extra);
            load(&vars)
        };

        assert!(with(("AUTH_JWT_ALGORITHM", "HS256")).is_err());
        assert!(with(("AUTH_REFRESH_TOKEN_MAX_COUNT", "0")).is_err());
        assert!(with(("AUTH_REFRESH_TOKEN_MAX_COUNT", "many")).is_err());
        assert!(with(("AUTH_JWT_TIME_TO_LIVE_SECS", "0")).is_err());
        assert!(with(("AUTH_JWT_TIME_TO_LIVE_SECS", "18446744073709551615")).is_err());
        assert!(with(("AUTH_REFRESH_TOKEN_TIME_TO_LIVE_SECS", "100000000000000000")).is_err());
        assert!(with(("AUTH_REFRESH_TOKEN_TIME_TO_LIVE_SECS", "315360000")).is_ok());
        assert!(with(("AUTH_PASSWORD_PEPPER", "not base64!")).is_err());
        assert!(with(("AUTH_REFRESH_TOKEN_SAME_SITE", "sometimes")).is_err());
    }

    #[test]
    fn test_requires_key_files() {
        assert!(load(&[]).is_err());
    }
}
