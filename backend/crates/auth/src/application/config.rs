//! Application Configuration
//!
//! Configuration for the Auth application layer. Key material is not part
//! of this struct: the signer and verifier are built from their own PEMs.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::jwt::Algorithm;

use crate::domain::services::RefreshTokenFactory;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// `iss` claim of issued access tokens
    pub issuer: String,
    /// Asymmetric JWT signing algorithm
    pub algorithm: Algorithm,
    /// Access token lifetime (10 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (30 days)
    pub refresh_token_ttl: Duration,
    /// Live refresh tokens per user before all are revoked
    pub refresh_token_max_count: usize,
    /// Refresh token cookie name
    pub refresh_cookie_name: String,
    /// Refresh token cookie path
    pub refresh_cookie_path: String,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "customers-api".to_string(),
            algorithm: Algorithm::EdDSA,
            access_token_ttl: Duration::from_secs(10 * 60), // 10 minutes
            refresh_token_ttl: Duration::from_secs(720 * 3600), // 30 days
            refresh_token_max_count: 5,
            refresh_cookie_name: "refresh_token".to_string(),
            refresh_cookie_path: "/api/auth".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Default::default()
        }
    }

    /// Cookie settings for the refresh token
    pub fn refresh_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.refresh_cookie_name.clone(),
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
            path: self.refresh_cookie_path.clone(),
        }
    }

    pub fn refresh_token_factory(&self) -> RefreshTokenFactory {
        RefreshTokenFactory::new(self.refresh_token_ttl, self.refresh_token_max_count)
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.issuer, "customers-api");
        assert_eq!(config.algorithm, Algorithm::EdDSA);
        assert_eq!(config.access_token_ttl, Duration::from_secs(600));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(2_592_000));
        assert_eq!(config.refresh_token_max_count, 5);
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_refresh_cookie_follows_config() {
        let cookie = AuthConfig::development().refresh_cookie();
        assert_eq!(cookie.name, "refresh_token");
        assert_eq!(cookie.path, "/api/auth");
        assert!(!cookie.secure);
    }

    #[test]
    fn test_pepper() {
        assert_eq!(AuthConfig::default().pepper(), None);

        let config = AuthConfig {
            password_pepper: Some(b"pepper".to_vec()),
            ..Default::default()
        };
        assert_eq!(config.pepper(), Some(&b"pepper"[..]));
    }

    #[test]
    fn test_factory_follows_config() {
        let config = AuthConfig {
            refresh_token_ttl: Duration::from_secs(90),
            refresh_token_max_count: 2,
            ..Default::default()
        };
        let factory = config.refresh_token_factory();
        assert_eq!(factory.ttl_secs(), 90);
        assert_eq!(factory.max_per_user(), 2);
    }
}
