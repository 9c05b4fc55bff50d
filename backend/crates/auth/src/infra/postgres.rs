//! PostgreSQL Repository Implementations
//!
//! Queries are written once against any `PgExecutor`, so the pool-backed
//! repository and the transaction handle share them.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use sqlx::postgres::{PgExecutor, PgPool};
use sqlx::{Postgres, Transaction as SqlxTransaction};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entity::{refresh_token::RefreshToken, user::User};
use crate::domain::repository::{RefreshTokenRepository, Transaction, UnitOfWork, UserRepository};
use crate::domain::value_object::{
    email::Email, fingerprint::Fingerprint, refresh_token_id::RefreshTokenId, user_id::UserId,
};
use crate::error::{AuthError, AuthResult};

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Queries
// ============================================================================

async fn insert_user<'e, E: PgExecutor<'e>>(executor: E, user: &User) -> AuthResult<()> {
    sqlx::query(
        r#"
        INSERT INTO users (
            user_id,
            email,
            password_hash,
            created_at
        ) VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user.user_id.as_uuid())
    .bind(user.email.as_str())
    .bind(user.password_hash.as_phc_string())
    .bind(user.created_at)
    .execute(executor)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            AuthError::EmailTaken
        }
        other => AuthError::from(other),
    })?;

    Ok(())
}

async fn select_user_by_email<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &Email,
) -> AuthResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT
            user_id,
            email,
            password_hash,
            created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email.as_str())
    .fetch_optional(executor)
    .await?;

    Ok(row.map(UserRow::into_user))
}

async fn select_user_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: &UserId,
) -> AuthResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT
            user_id,
            email,
            password_hash,
            created_at
        FROM users
        WHERE user_id = $1
        "#,
    )
    .bind(user_id.as_uuid())
    .fetch_optional(executor)
    .await?;

    Ok(row.map(UserRow::into_user))
}

async fn insert_refresh_token<'e, E: PgExecutor<'e>>(
    executor: E,
    token: &RefreshToken,
) -> AuthResult<()> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (
            token_id,
            user_id,
            fingerprint,
            ttl_secs,
            created_at
        ) VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(token.token_id.as_uuid())
    .bind(token.user_id.as_uuid())
    .bind(token.fingerprint.as_str())
    .bind(token.ttl_secs)
    .bind(token.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

async fn select_refresh_token<'e, E: PgExecutor<'e>>(
    executor: E,
    token_id: &RefreshTokenId,
) -> AuthResult<Option<RefreshToken>> {
    let row = sqlx::query_as::<_, RefreshTokenRow>(
        r#"
        SELECT
            token_id,
            user_id,
            fingerprint,
            ttl_secs,
            created_at
        FROM refresh_tokens
        WHERE token_id = $1
        "#,
    )
    .bind(token_id.as_uuid())
    .fetch_optional(executor)
    .await?;

    Ok(row.map(RefreshTokenRow::into_token))
}

async fn select_refresh_tokens_of<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: &UserId,
) -> AuthResult<Vec<RefreshToken>> {
    let rows = sqlx::query_as::<_, RefreshTokenRow>(
        r#"
        SELECT
            token_id,
            user_id,
            fingerprint,
            ttl_secs,
            created_at
        FROM refresh_tokens
        WHERE user_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(user_id.as_uuid())
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(RefreshTokenRow::into_token).collect())
}

async fn delete_refresh_token<'e, E: PgExecutor<'e>>(
    executor: E,
    token_id: &RefreshTokenId,
) -> AuthResult<bool> {
    let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE token_id = $1")
        .bind(token_id.as_uuid())
        .execute(executor)
        .await?
        .rows_affected();

    Ok(deleted > 0)
}

async fn delete_refresh_tokens_of<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: &UserId,
) -> AuthResult<u64> {
    let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id.as_uuid())
        .execute(executor)
        .await?
        .rows_affected();

    Ok(deleted)
}

async fn delete_expired_refresh_tokens<'e, E: PgExecutor<'e>>(
    executor: E,
    now: DateTime<Utc>,
) -> AuthResult<u64> {
    let deleted = sqlx::query(
        "DELETE FROM refresh_tokens WHERE created_at + ttl_secs * INTERVAL '1 second' <= $1",
    )
    .bind(now)
    .execute(executor)
    .await?
    .rows_affected();

    Ok(deleted)
}

// ============================================================================
// Pool-backed Repository
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        insert_user(&self.pool, user).await
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        select_user_by_email(&self.pool, email).await
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        select_user_by_id(&self.pool, user_id).await
    }
}

impl RefreshTokenRepository for PgAuthRepository {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        insert_refresh_token(&self.pool, token).await
    }

    async fn find_by_id(&self, token_id: &RefreshTokenId) -> AuthResult<Option<RefreshToken>> {
        select_refresh_token(&self.pool, token_id).await
    }

    async fn find_all_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<RefreshToken>> {
        select_refresh_tokens_of(&self.pool, user_id).await
    }

    async fn delete_by_id(&self, token_id: &RefreshTokenId) -> AuthResult<bool> {
        delete_refresh_token(&self.pool, token_id).await
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> AuthResult<u64> {
        delete_refresh_tokens_of(&self.pool, user_id).await
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = delete_expired_refresh_tokens(&self.pool, now).await?;

        tracing::info!(tokens_deleted = deleted, "Cleaned up expired refresh tokens");

        Ok(deleted)
    }
}

impl UnitOfWork for PgAuthRepository {
    type Tx = PgTransaction;

    async fn begin(&self) -> AuthResult<PgTransaction> {
        let tx = self.pool.begin().await?;
        Ok(PgTransaction { tx: Mutex::new(tx) })
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// Open PostgreSQL transaction
///
/// The connection is behind an async mutex because the repository traits
/// take `&self`. Dropping without commit rolls back (sqlx semantics).
pub struct PgTransaction {
    tx: Mutex<SqlxTransaction<'static, Postgres>>,
}

impl Transaction for PgTransaction {
    type Users = Self;
    type RefreshTokens = Self;

    fn users(&self) -> &Self {
        self
    }

    fn refresh_tokens(&self) -> &Self {
        self
    }

    async fn commit(self) -> AuthResult<()> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }

    async fn rollback(self) -> AuthResult<()> {
        self.tx.into_inner().rollback().await?;
        Ok(())
    }
}

impl UserRepository for PgTransaction {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut tx = self.tx.lock().await;
        insert_user(&mut **tx, user).await
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let mut tx = self.tx.lock().await;
        select_user_by_email(&mut **tx, email).await
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let mut tx = self.tx.lock().await;
        select_user_by_id(&mut **tx, user_id).await
    }
}

impl RefreshTokenRepository for PgTransaction {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        let mut tx = self.tx.lock().await;
        insert_refresh_token(&mut **tx, token).await
    }

    async fn find_by_id(&self, token_id: &RefreshTokenId) -> AuthResult<Option<RefreshToken>> {
        let mut tx = self.tx.lock().await;
        select_refresh_token(&mut **tx, token_id).await
    }

    async fn find_all_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<RefreshToken>> {
        let mut tx = self.tx.lock().await;
        select_refresh_tokens_of(&mut **tx, user_id).await
    }

    async fn delete_by_id(&self, token_id: &RefreshTokenId) -> AuthResult<bool> {
        let mut tx = self.tx.lock().await;
        delete_refresh_token(&mut **tx, token_id).await
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> AuthResult<u64> {
        let mut tx = self.tx.lock().await;
        delete_refresh_tokens_of(&mut **tx, user_id).await
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut tx = self.tx.lock().await;
        delete_expired_refresh_tokens(&mut **tx, now).await
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            password_hash: HashedPassword::from_db(self.password_hash),
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    token_id: Uuid,
    user_id: Uuid,
    fingerprint: String,
    ttl_secs: i64,
    created_at: DateTime<Utc>,
}

impl RefreshTokenRow {
    fn into_token(self) -> RefreshToken {
        RefreshToken {
            token_id: RefreshTokenId::from_uuid(self.token_id),
            user_id: UserId::from_uuid(self.user_id),
            fingerprint: Fingerprint::from_db(self.fingerprint),
            ttl_secs: self.ttl_secs,
            created_at: self.created_at,
        }
    }
}
