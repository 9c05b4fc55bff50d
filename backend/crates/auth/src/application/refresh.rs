//! Refresh Use Case
//!
//! Redeems a refresh token for a new access/refresh token pair.
//!
//! The presented token is deleted before it is validated. Whatever the
//! outcome, it can never be redeemed again; a lost delete race means some
//! other caller already redeemed it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::jwt::AccessTokenSigner;

use crate::application::SessionTokens;
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::domain::services::RefreshTokenFactory;
use crate::domain::value_object::{fingerprint::Fingerprint, refresh_token_id::parse_refresh_token_id};
use crate::error::{AuthError, AuthResult};

/// Refresh input
pub struct RefreshInput {
    /// Token id as presented by the client
    pub refresh_token_id: String,
    pub fingerprint: String,
}

/// Refresh use case
pub struct RefreshUseCase<U, R>
where
    U: UserRepository,
    R: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<R>,
    signer: Arc<AccessTokenSigner>,
    factory: RefreshTokenFactory,
}

impl<U, R> RefreshUseCase<U, R>
where
    U: UserRepository + Send + Sync,
    R: RefreshTokenRepository + Send + Sync,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<R>,
        signer: Arc<AccessTokenSigner>,
        factory: RefreshTokenFactory,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            signer,
            factory,
        }
    }

    pub async fn execute(&self, input: RefreshInput, now: DateTime<Utc>) -> AuthResult<SessionTokens> {
        let token_id =
            parse_refresh_token_id(&input.refresh_token_id).ok_or(AuthError::InvalidRefreshToken)?;

        let token = self
            .token_repo
            .find_by_id(&token_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        // Claim the token. From here on it is consumed.
        if !self.token_repo.delete_by_id(&token_id).await? {
            tracing::warn!(refresh_token_id = %token_id, "Refresh token redeemed concurrently");
            return Err(AuthError::InvalidRefreshToken);
        }

        let presented = Fingerprint::new(input.fingerprint).ok();
        if !presented.as_ref().is_some_and(|fp| token.is_bound_to(fp)) {
            tracing::warn!(
                user_id = %token.user_id,
                refresh_token_id = %token_id,
                "Refresh token presented with foreign fingerprint"
            );
            return Err(AuthError::FingerprintMismatch);
        }

        if token.is_expired_at(now) {
            tracing::warn!(
                user_id = %token.user_id,
                refresh_token_id = %token_id,
                expired_at = ?token.expires_at(),
                "Expired refresh token presented"
            );
            return Err(AuthError::RefreshTokenExpired);
        }

        let user = self
            .user_repo
            .find_by_id(&token.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let access = self.signer.sign(user.email.as_str(), now)?;

        let refresh = self.factory.issue(user.user_id, token.fingerprint, now);
        self.token_repo.create(&refresh).await?;

        tracing::info!(
            user_id = %user.user_id,
            redeemed = %token_id,
            refresh_token_id = %refresh.token_id,
            "Refresh token rotated"
        );

        Ok(SessionTokens {
            access_token: access.token,
            access_token_expires_at: access.expires_at,
            refresh_token_id: refresh.token_id,
            refresh_token_ttl_secs: refresh.ttl_secs,
        })
    }
}
