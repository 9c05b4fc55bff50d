//! Password Hashing and Verification
//!
//! NIST SP 800-63B compliant password handling with:
//! - Argon2id hashing (memory-hard, recommended by OWASP)
//! - Zeroization of sensitive data
//! - Constant-time comparison
//! - Optional application-wide pepper
//!
//! Verification deliberately collapses every failure (wrong password,
//! unparseable hash) into [`PasswordHashError::WrongPassword`].

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

// ============================================================================
// Constants (NIST SP 800-63B compliant)
// ============================================================================

/// Minimum password length (NIST: SHALL be at least 8)
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (NIST: SHOULD permit at least 64)
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed (RNG or algorithm fault)
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Argon2 parameters rejected at construction
    #[error("Invalid password hashing parameters: {0}")]
    InvalidParams(String),

    /// Password does not match the stored hash
    #[error("Wrong password")]
    WrongPassword,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Create a new clear text password with validation
    ///
    /// Unicode is normalized using NFKC before validation, and length is
    /// counted in code points, not bytes.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let mut raw = raw;
        // Wrapped immediately so rejected input is zeroized on drop too
        let password = Self(raw.nfkc().collect());
        raw.zeroize();

        if password.0.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = password.0.chars().count();

        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        // Space, tab and newline are allowed
        if password
            .0
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        Ok(password)
    }

    /// Create without validation (for testing or trusted input)
    #[cfg(test)]
    pub fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
///
/// The PHC string embeds algorithm, version, cost parameters and salt, so
/// a hash produced with older parameters still verifies.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Wrap a PHC string loaded from storage
    ///
    /// Not validated here: a corrupted value simply never verifies.
    pub fn from_db(s: impl Into<String>) -> Self {
        Self { hash: s.into() }
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Hasher
// ============================================================================

/// Argon2id hasher holding the cost parameters and optional pepper
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    pepper: Option<Zeroizing<Vec<u8>>>,
}

impl PasswordHasher {
    /// OWASP recommended Argon2id parameters: m=19456 (19 MiB), t=2, p=1
    pub fn new(pepper: Option<Vec<u8>>) -> Self {
        Self {
            params: Params::default(),
            pepper: pepper.map(Zeroizing::new),
        }
    }

    /// Custom cost parameters (memory in KiB, iterations, parallelism)
    pub fn with_cost(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
        pepper: Option<Vec<u8>>,
    ) -> Result<Self, PasswordHashError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;

        Ok(Self {
            params,
            pepper: pepper.map(Zeroizing::new),
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn peppered(&self, password: &ClearTextPassword) -> Zeroizing<Vec<u8>> {
        let mut combined = Zeroizing::new(password.as_bytes().to_vec());
        if let Some(pepper) = &self.pepper {
            combined.extend_from_slice(pepper);
        }
        combined
    }

    /// Hash the password with a fresh 128-bit salt
    pub fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let input = self.peppered(password);

        let hash = self
            .argon2()
            .hash_password(input.as_slice(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }

    /// Verify a password against a stored hash
    ///
    /// Argon2 compares digests in constant time. Cost parameters are read
    /// from the PHC string, not from `self`.
    pub fn verify(
        &self,
        hashed: &HashedPassword,
        password: &ClearTextPassword,
    ) -> Result<(), PasswordHashError> {
        let parsed =
            PasswordHash::new(&hashed.hash).map_err(|_| PasswordHashError::WrongPassword)?;
        let input = self.peppered(password);

        self.argon2()
            .verify_password(input.as_slice(), &parsed)
            .map_err(|_| PasswordHashError::WrongPassword)
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", &self.params)
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_hasher(pepper: Option<&[u8]>) -> PasswordHasher {
        PasswordHasher::with_cost(256, 1, 1, pepper.map(|p| p.to_vec())).unwrap()
    }

    #[test]
    fn test_password_too_short() {
        let result = ClearTextPassword::new("short".to_string());
        assert!(matches!(result, Err(PasswordPolicyError::TooShort { .. })));
    }

    #[test]
    fn test_password_too_long() {
        let long_password = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        let result = ClearTextPassword::new(long_password);
        assert!(matches!(result, Err(PasswordPolicyError::TooLong { .. })));
    }

    #[test]
    fn test_password_whitespace_only() {
        let result = ClearTextPassword::new("        ".to_string());
        assert!(matches!(
            result,
            Err(PasswordPolicyError::EmptyOrWhitespace)
        ));
    }

    #[test]
    fn test_password_control_character() {
        let result = ClearTextPassword::new("secret\u{0007}password".to_string());
        assert!(matches!(result, Err(PasswordPolicyError::InvalidCharacter)));
    }

    #[test]
    fn test_unicode_password_counts_code_points() {
        // 9 code points, 27 bytes
        let result = ClearTextPassword::new("パスワード安全です".to_string());
        assert!(result.is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = cheap_hasher(None);
        let password = ClearTextPassword::new_unchecked("secret_password".to_string());
        let hashed = hasher.hash(&password).unwrap();

        assert!(hashed.as_phc_string().starts_with("$argon2id$"));
        assert!(hasher.verify(&hashed, &password).is_ok());

        let wrong = ClearTextPassword::new_unchecked("invalid_password".to_string());
        assert!(matches!(
            hasher.verify(&hashed, &wrong),
            Err(PasswordHashError::WrongPassword)
        ));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = cheap_hasher(None);
        let password = ClearTextPassword::new_unchecked("secret_password".to_string());
        let first = hasher.hash(&password).unwrap();
        let second = hasher.hash(&password).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_hash_with_pepper() {
        let password = ClearTextPassword::new_unchecked("secret_password".to_string());
        let peppered = cheap_hasher(Some(b"my_secret_pepper"));
        let hashed = peppered.hash(&password).unwrap();

        assert!(peppered.verify(&hashed, &password).is_ok());
        assert!(cheap_hasher(None).verify(&hashed, &password).is_err());
        assert!(
            cheap_hasher(Some(b"wrong_pepper"))
                .verify(&hashed, &password)
                .is_err()
        );
    }

    #[test]
    fn test_malformed_hash_is_wrong_password() {
        let hasher = cheap_hasher(None);
        let password = ClearTextPassword::new_unchecked("secret_password".to_string());
        let corrupted = HashedPassword::from_db("not_a_valid_hash");
        assert!(matches!(
            hasher.verify(&corrupted, &password),
            Err(PasswordHashError::WrongPassword)
        ));
    }

    #[test]
    fn test_verify_uses_stored_parameters() {
        let password = ClearTextPassword::new_unchecked("secret_password".to_string());
        let hashed = cheap_hasher(None).hash(&password).unwrap();
        // A hasher configured with different costs still verifies old hashes
        let other = PasswordHasher::with_cost(512, 2, 1, None).unwrap();
        assert!(other.verify(&hashed, &password).is_ok());
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::new_unchecked("secret".to_string());
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret"));

        let hasher = cheap_hasher(Some(b"pepper-value"));
        assert!(!format!("{:?}", hasher).contains("pepper-value"));
    }
}
