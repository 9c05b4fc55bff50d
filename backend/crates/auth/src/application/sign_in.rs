//! Sign In Use Case
//!
//! Verifies credentials and opens a session: one access token plus one
//! refresh token. Everything after the user lookup runs in a single
//! transaction, so quota eviction and the new refresh token are
//! all-or-nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::jwt::AccessTokenSigner;
use platform::password::{ClearTextPassword, PasswordHasher};

use crate::application::SessionTokens;
use crate::domain::repository::{RefreshTokenRepository, Transaction, UnitOfWork, UserRepository};
use crate::domain::services::RefreshTokenFactory;
use crate::domain::value_object::{email::Email, fingerprint::Fingerprint, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    /// Device fingerprint the refresh token is bound to
    pub fingerprint: String,
}

/// Sign in use case
pub struct SignInUseCase<W>
where
    W: UnitOfWork,
{
    uow: Arc<W>,
    hasher: Arc<PasswordHasher>,
    signer: Arc<AccessTokenSigner>,
    factory: RefreshTokenFactory,
}

impl<W> SignInUseCase<W>
where
    W: UnitOfWork + Send + Sync,
{
    pub fn new(
        uow: Arc<W>,
        hasher: Arc<PasswordHasher>,
        signer: Arc<AccessTokenSigner>,
        factory: RefreshTokenFactory,
    ) -> Self {
        Self {
            uow,
            hasher,
            signer,
            factory,
        }
    }

    pub async fn execute(&self, input: SignInInput, now: DateTime<Utc>) -> AuthResult<SessionTokens> {
        let fingerprint = Fingerprint::new(input.fingerprint)
            .map_err(|e| AuthError::InvalidFingerprint(e.message().to_string()))?;

        let tx = self.uow.begin().await?;

        let result = self
            .sign_in_within(&tx, input.email, input.password, fingerprint, now)
            .await;

        match result {
            Ok((user_id, tokens)) => {
                tx.commit().await?;

                tracing::info!(
                    user_id = %user_id,
                    refresh_token_id = %tokens.refresh_token_id,
                    "User signed in"
                );
                Ok(tokens)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Sign in rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn sign_in_within(
        &self,
        tx: &W::Tx,
        email: String,
        password: String,
        fingerprint: Fingerprint,
        now: DateTime<Utc>,
    ) -> AuthResult<(UserId, SessionTokens)> {
        // Unknown user, malformed email and wrong password all look the same
        let email = Email::new(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = tx
            .users()
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password =
            ClearTextPassword::new(password).map_err(|_| AuthError::InvalidCredentials)?;
        self.hasher.verify(&user.password_hash, &password)?;

        let access = self.signer.sign(user.email.as_str(), now)?;

        let existing = tx
            .refresh_tokens()
            .find_all_by_user_id(&user.user_id)
            .await?;
        if existing.len() >= self.factory.max_per_user() {
            let revoked = tx
                .refresh_tokens()
                .delete_by_user_id(&user.user_id)
                .await?;
            tracing::info!(
                user_id = %user.user_id,
                revoked = revoked,
                "Refresh token quota reached, revoked all sessions"
            );
        }

        let refresh = self.factory.issue(user.user_id, fingerprint, now);
        tx.refresh_tokens().create(&refresh).await?;

        Ok((
            user.user_id,
            SessionTokens {
                access_token: access.token,
                access_token_expires_at: access.expires_at,
                refresh_token_id: refresh.token_id,
                refresh_token_ttl_secs: refresh.ttl_secs,
            },
        ))
    }
}
