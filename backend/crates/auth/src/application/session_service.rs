//! Session Service
//!
//! Entry point for the four session operations. Owns the collaborators
//! (store, hasher, signer, refresh token factory) and hands them to the
//! individual use cases.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::jwt::AccessTokenSigner;
use platform::password::PasswordHasher;

use crate::application::config::AuthConfig;
use crate::application::refresh::{RefreshInput, RefreshUseCase};
use crate::application::sign_in::{SignInInput, SignInUseCase};
use crate::application::sign_out::SignOutUseCase;
use crate::application::sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};
use crate::application::SessionTokens;
use crate::domain::repository::{RefreshTokenRepository, UnitOfWork, UserRepository};
use crate::domain::services::RefreshTokenFactory;
use crate::error::AuthResult;

/// Session operations over a store implementing all repository contracts
pub struct SessionService<R> {
    repo: Arc<R>,
    hasher: Arc<PasswordHasher>,
    signer: Arc<AccessTokenSigner>,
    factory: RefreshTokenFactory,
}

impl<R> Clone for SessionService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            hasher: self.hasher.clone(),
            signer: self.signer.clone(),
            factory: self.factory,
        }
    }
}

impl<R> SessionService<R>
where
    R: UserRepository + RefreshTokenRepository + UnitOfWork + Send + Sync + 'static,
{
    pub fn new(
        repo: Arc<R>,
        hasher: PasswordHasher,
        signer: AccessTokenSigner,
        factory: RefreshTokenFactory,
    ) -> Self {
        Self {
            repo,
            hasher: Arc::new(hasher),
            signer: Arc::new(signer),
            factory,
        }
    }

    /// Production wiring: default Argon2 cost with the configured pepper
    pub fn from_config(repo: Arc<R>, config: &AuthConfig, signer: AccessTokenSigner) -> Self {
        Self::new(
            repo,
            PasswordHasher::new(config.pepper().map(<[u8]>::to_vec)),
            signer,
            config.refresh_token_factory(),
        )
    }

    pub async fn sign_up(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        SignUpUseCase::new(self.repo.clone(), self.hasher.clone())
            .execute(input)
            .await
    }

    pub async fn login(&self, input: SignInInput, now: DateTime<Utc>) -> AuthResult<SessionTokens> {
        SignInUseCase::new(
            self.repo.clone(),
            self.hasher.clone(),
            self.signer.clone(),
            self.factory,
        )
        .execute(input, now)
        .await
    }

    pub async fn refresh(
        &self,
        input: RefreshInput,
        now: DateTime<Utc>,
    ) -> AuthResult<SessionTokens> {
        RefreshUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.signer.clone(),
            self.factory,
        )
        .execute(input, now)
        .await
    }

    pub async fn logout(&self, refresh_token_id: &str) -> AuthResult<()> {
        SignOutUseCase::new(self.repo.clone())
            .execute(refresh_token_id)
            .await
    }

    /// Remove refresh tokens that can no longer be redeemed
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        self.repo.cleanup_expired(now).await
    }
}
