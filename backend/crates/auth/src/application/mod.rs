//! Application Layer
//!
//! Use cases and the session service that wires them together.

pub mod config;
pub mod refresh;
pub mod session_service;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

use crate::domain::value_object::refresh_token_id::RefreshTokenId;

// Re-exports
pub use config::AuthConfig;
pub use refresh::{RefreshInput, RefreshUseCase};
pub use session_service::SessionService;
pub use sign_in::{SignInInput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};

/// Result of a successful sign in or refresh
#[derive(Debug, Clone)]
pub struct SessionTokens {
    /// Signed access token
    pub access_token: String,
    /// Access token expiry (Unix seconds)
    pub access_token_expires_at: i64,
    /// Id of the newly issued refresh token
    pub refresh_token_id: RefreshTokenId,
    /// Refresh token lifetime, for the cookie Max-Age
    pub refresh_token_ttl_secs: i64,
}
