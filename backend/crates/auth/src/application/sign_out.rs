//! Sign Out Use Case
//!
//! Revokes a refresh token. Idempotent: unknown or malformed ids are a no-op.

use std::sync::Arc;

use crate::domain::repository::RefreshTokenRepository;
use crate::domain::value_object::refresh_token_id::parse_refresh_token_id;
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<R>
where
    R: RefreshTokenRepository,
{
    token_repo: Arc<R>,
}

impl<R> SignOutUseCase<R>
where
    R: RefreshTokenRepository + Send + Sync,
{
    pub fn new(token_repo: Arc<R>) -> Self {
        Self { token_repo }
    }

    pub async fn execute(&self, refresh_token_id: &str) -> AuthResult<()> {
        let Some(token_id) = parse_refresh_token_id(refresh_token_id) else {
            return Ok(());
        };

        if self.token_repo.delete_by_id(&token_id).await? {
            tracing::info!(refresh_token_id = %token_id, "User signed out");
        }
        Ok(())
    }
}
