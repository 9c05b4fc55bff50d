//! Refresh Token Entity
//!
//! Persisted, single-use credential bound to a device fingerprint.
//! Validity is `fingerprint == presented && now < created_at + ttl_secs`.

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::value_object::{
    fingerprint::Fingerprint, refresh_token_id::RefreshTokenId, user_id::UserId,
};

/// Refresh token entity
#[derive(Debug, Clone)]
pub struct RefreshToken {
    /// Token id (the bearer value stored in the client cookie)
    pub token_id: RefreshTokenId,
    /// Owning user
    pub user_id: UserId,
    /// Device fingerprint supplied at issuance
    pub fingerprint: Fingerprint,
    /// Time to live in seconds
    pub ttl_secs: i64,
    /// Issuance timestamp
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Instant from which the token is no longer valid
    ///
    /// `None` when `created_at + ttl_secs` is beyond the representable range,
    /// i.e. the token never expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        TimeDelta::try_seconds(self.ttl_secs)
            .and_then(|ttl| self.created_at.checked_add_signed(ttl))
    }

    /// Expired iff `created_at + ttl_secs <= now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires_at| expires_at <= now)
    }

    pub fn is_bound_to(&self, presented: &Fingerprint) -> bool {
        self.fingerprint.matches(presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(created_at: DateTime<Utc>, ttl_secs: i64) -> RefreshToken {
        RefreshToken {
            token_id: RefreshTokenId::new(),
            user_id: UserId::new(),
            fingerprint: Fingerprint::new("device-1").unwrap(),
            ttl_secs,
            created_at,
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let created = Utc::now();
        let t = token(created, 60);

        assert!(!t.is_expired_at(created));
        assert!(!t.is_expired_at(created + Duration::seconds(59)));
        // Exactly at created_at + ttl the token is already dead
        assert!(t.is_expired_at(created + Duration::seconds(60)));
        assert!(t.is_expired_at(created + Duration::seconds(61)));
    }

    #[test]
    fn test_out_of_range_ttl_never_expires() {
        let created = Utc::now();
        let t = token(created, i64::MAX);

        assert!(t.expires_at().is_none());
        assert!(!t.is_expired_at(created + Duration::days(365 * 1000)));
    }

    #[test]
    fn test_fingerprint_binding() {
        let t = token(Utc::now(), 60);
        assert!(t.is_bound_to(&Fingerprint::new("device-1").unwrap()));
        assert!(!t.is_bound_to(&Fingerprint::new("device-2").unwrap()));
    }
}
