//! Domain Services
//!
//! Refresh token minting. Pure construction, no I/O.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::entity::refresh_token::RefreshToken;
use crate::domain::value_object::{
    fingerprint::Fingerprint, refresh_token_id::RefreshTokenId, user_id::UserId,
};

/// Mints refresh tokens with the configured TTL and exposes the per-user quota
#[derive(Debug, Clone, Copy)]
pub struct RefreshTokenFactory {
    ttl_secs: i64,
    max_per_user: usize,
}

impl RefreshTokenFactory {
    pub fn new(ttl: Duration, max_per_user: usize) -> Self {
        Self {
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
            max_per_user,
        }
    }

    /// New token with a fresh random id, bound to `fingerprint`
    pub fn issue(
        &self,
        user_id: UserId,
        fingerprint: Fingerprint,
        created_at: DateTime<Utc>,
    ) -> RefreshToken {
        RefreshToken {
            token_id: RefreshTokenId::new(),
            user_id,
            fingerprint,
            ttl_secs: self.ttl_secs,
            created_at,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Maximum number of live tokens a user may hold
    pub fn max_per_user(&self) -> usize {
        self.max_per_user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_uses_configured_ttl() {
        let factory = RefreshTokenFactory::new(Duration::from_secs(720 * 3600), 5);
        let now = Utc::now();
        let user_id = UserId::new();

        let token = factory.issue(user_id, Fingerprint::new("device-1").unwrap(), now);

        assert_eq!(token.ttl_secs, 720 * 3600);
        assert_eq!(token.created_at, now);
        assert_eq!(token.user_id, user_id);
        assert_eq!(factory.max_per_user(), 5);
    }

    #[test]
    fn test_issue_generates_fresh_ids() {
        let factory = RefreshTokenFactory::new(Duration::from_secs(60), 5);
        let fp = Fingerprint::new("device-1").unwrap();
        let a = factory.issue(UserId::new(), fp.clone(), Utc::now());
        let b = factory.issue(UserId::new(), fp, Utc::now());
        assert_ne!(a.token_id, b.token_id);
    }
}
