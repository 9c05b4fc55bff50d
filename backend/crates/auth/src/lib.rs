//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, token factory
//! - `application/` - Use cases and the session service
//! - `infra/` - PostgreSQL and in-memory store implementations
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Email + password signup and login
//! - Short-lived signed access tokens (asymmetric JWT)
//! - Single-use refresh tokens bound to a device fingerprint
//! - Per-user refresh token quota (all tokens revoked when reached)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Refresh tokens are deleted before they are validated, so a token id
//!   is redeemed at most once even under concurrent use
//! - Login credential check, quota eviction and token issuance share one
//!   transaction

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::session_service::SessionService;
pub use error::{AuthError, AuthResult};
pub use infra::{memory::MemoryAuthStore, postgres::PgAuthRepository};
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
