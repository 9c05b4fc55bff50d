//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//!
//! "Not found" is always `Ok(None)`; `Err` is reserved for store failures.

use chrono::{DateTime, Utc};

use crate::domain::entity::{refresh_token::RefreshToken, user::User};
use crate::domain::value_object::{
    email::Email, refresh_token_id::RefreshTokenId, user_id::UserId,
};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    ///
    /// A uniqueness conflict on email surfaces as `AuthError::EmailTaken`.
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;
}

/// Refresh token repository trait
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    /// Persist a freshly minted token
    async fn create(&self, token: &RefreshToken) -> AuthResult<()>;

    /// Find token by ID
    async fn find_by_id(&self, token_id: &RefreshTokenId) -> AuthResult<Option<RefreshToken>>;

    /// All stored tokens of a user, expired ones included
    async fn find_all_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<RefreshToken>>;

    /// Delete a token, returning whether a row was removed
    ///
    /// Exactly one of several concurrent callers observes `true`.
    async fn delete_by_id(&self, token_id: &RefreshTokenId) -> AuthResult<bool>;

    /// Delete every token of a user, returning the number removed
    async fn delete_by_user_id(&self, user_id: &UserId) -> AuthResult<u64>;

    /// Purge tokens with `created_at + ttl <= now`
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

/// An open transaction
///
/// Both repositories returned by the accessors operate inside the same
/// transaction. Dropping the handle without `commit` rolls it back.
#[trait_variant::make(Transaction: Send)]
pub trait LocalTransaction: Sized {
    type Users: UserRepository + Send + Sync;
    type RefreshTokens: RefreshTokenRepository + Send + Sync;

    fn users(&self) -> &Self::Users;

    fn refresh_tokens(&self) -> &Self::RefreshTokens;

    async fn commit(self) -> AuthResult<()>;

    async fn rollback(self) -> AuthResult<()>;
}

/// Opens transactions over the user and refresh token stores
#[trait_variant::make(UnitOfWork: Send)]
pub trait LocalUnitOfWork {
    type Tx: Transaction + Send + Sync;

    async fn begin(&self) -> AuthResult<Self::Tx>;
}
