//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::jwt::JwtError;
use platform::password::PasswordHashError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user or wrong password (indistinguishable on purpose)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Email already registered
    #[error("Email is already registered")]
    EmailTaken,

    /// Unknown, malformed or already redeemed refresh token
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Refresh token presented from another device
    #[error("Refresh token fingerprint mismatch")]
    FingerprintMismatch,

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Access token signing failed
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backing store could not be reached
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid access token")]
    InvalidAccessToken,

    #[error("Access token expired")]
    AccessTokenExpired,

    #[error("Missing bearer token")]
    MissingBearerToken,

    #[error("Missing refresh token")]
    MissingRefreshToken,

    /// Email failed validation at signup
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Fingerprint missing or oversized at login
    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    /// Password validation error
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::InvalidAccessToken
            | AuthError::AccessTokenExpired
            | AuthError::MissingBearerToken => ErrorKind::Unauthorized,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::FingerprintMismatch
            | AuthError::RefreshTokenExpired
            | AuthError::MissingRefreshToken
            | AuthError::InvalidEmail(_)
            | AuthError::InvalidFingerprint(_)
            | AuthError::PasswordValidation(_) => ErrorKind::BadRequest,
            AuthError::StoreUnavailable(_) => ErrorKind::ServiceUnavailable,
            AuthError::Hashing(_)
            | AuthError::Signing(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Server-side failures are reported with a generic message so that
    /// driver or key details never reach the client.
    pub fn to_app_error(&self) -> AppError {
        if self.kind().is_server_error() {
            AppError::new(self.kind(), self.kind().as_str())
        } else {
            AppError::new(self.kind(), self.to_string())
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::StoreUnavailable(msg) => {
                tracing::error!(message = %msg, "Auth store unavailable");
            }
            AuthError::Hashing(msg) | AuthError::Signing(msg) | AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::FingerprintMismatch => {
                tracing::warn!("Refresh token fingerprint mismatch detected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<PasswordHashError> for AuthError {
    fn from(err: PasswordHashError) -> Self {
        match err {
            PasswordHashError::WrongPassword => AuthError::InvalidCredentials,
            other => AuthError::Hashing(other.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::AccessTokenExpired,
            JwtError::AlgorithmMismatch
            | JwtError::InvalidSignature
            | JwtError::InvalidClaims(_)
            | JwtError::Malformed(_) => AuthError::InvalidAccessToken,
            JwtError::Signing(msg) => AuthError::Signing(msg),
            JwtError::UnsupportedAlgorithm(_) | JwtError::InvalidKey(_) => {
                AuthError::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidRefreshToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::EmailTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(AuthError::FingerprintMismatch.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::RefreshTokenExpired.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::StoreUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AuthError::Signing("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_wrong_password_maps_to_invalid_credentials() {
        let err: AuthError = PasswordHashError::WrongPassword.into();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err: AuthError = PasswordHashError::HashingFailed("rng".into()).into();
        assert!(matches!(err, AuthError::Hashing(_)));
    }

    #[test]
    fn test_jwt_errors_map_to_token_failures() {
        assert!(matches!(AuthError::from(JwtError::Expired), AuthError::AccessTokenExpired));
        assert!(matches!(
            AuthError::from(JwtError::AlgorithmMismatch),
            AuthError::InvalidAccessToken
        ));
        assert!(matches!(
            AuthError::from(JwtError::Signing("x".into())),
            AuthError::Signing(_)
        ));
    }

    #[test]
    fn test_server_errors_hide_details() {
        let app = AuthError::Internal("secret path /etc/key.pem".into()).to_app_error();
        assert!(!app.message().contains("/etc/key.pem"));

        let app = AuthError::EmailTaken.to_app_error();
        assert_eq!(app.message(), "Email is already registered");
    }
}
