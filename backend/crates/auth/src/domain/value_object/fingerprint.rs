//! Device Fingerprint Value Object
//!
//! Opaque client-supplied identifier bound to a refresh token at issuance.
//! Never interpreted, only compared.

use std::fmt;

use kernel::error::app_error::{AppError, AppResult};
use platform::crypto::constant_time_eq;

/// Maximum accepted fingerprint length
pub const FINGERPRINT_MAX_LENGTH: usize = 256;

#[derive(Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Accepts any non-blank string up to [`FINGERPRINT_MAX_LENGTH`] chars
    pub fn new(raw: impl Into<String>) -> AppResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(AppError::bad_request("Fingerprint cannot be empty"));
        }
        if raw.chars().count() > FINGERPRINT_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Fingerprint must be at most {} characters",
                FINGERPRINT_MAX_LENGTH
            )));
        }
        Ok(Self(raw))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time equality against a presented fingerprint
    pub fn matches(&self, presented: &Fingerprint) -> bool {
        constant_time_eq(self.0.as_bytes(), presented.0.as_bytes())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({} chars)", self.0.chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_validation() {
        assert!(Fingerprint::new("device-1").is_ok());
        assert!(Fingerprint::new("").is_err());
        assert!(Fingerprint::new("   ").is_err());
        assert!(Fingerprint::new("x".repeat(FINGERPRINT_MAX_LENGTH)).is_ok());
        assert!(Fingerprint::new("x".repeat(FINGERPRINT_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_fingerprint_matches() {
        let bound = Fingerprint::new("device-1").unwrap();
        assert!(bound.matches(&Fingerprint::new("device-1").unwrap()));
        assert!(!bound.matches(&Fingerprint::new("device-2").unwrap()));
        assert!(!bound.matches(&Fingerprint::new("Device-1").unwrap()));
    }
}
