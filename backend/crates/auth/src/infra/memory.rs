//! In-Memory Repository Implementation
//!
//! Process-local store with the same contracts as the PostgreSQL one.
//! Used when no database is configured and by the test suites.
//!
//! Transactions are serialised by a store-wide async lock and record an
//! undo journal; rollback (explicit or by drop) replays it in reverse.
//! Store-level calls wait on the same lock, so uncommitted writes are
//! never visible outside their transaction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use crate::domain::entity::{refresh_token::RefreshToken, user::User};
use crate::domain::repository::{RefreshTokenRepository, Transaction, UnitOfWork, UserRepository};
use crate::domain::value_object::{
    email::Email, refresh_token_id::RefreshTokenId, user_id::UserId,
};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    emails: HashMap<String, UserId>,
    tokens: HashMap<RefreshTokenId, RefreshToken>,
}

impl State {
    fn insert_user(&mut self, user: &User) -> AuthResult<()> {
        if self.emails.contains_key(user.email.as_str()) || self.users.contains_key(&user.user_id)
        {
            return Err(AuthError::EmailTaken);
        }
        self.emails
            .insert(user.email.as_str().to_string(), user.user_id);
        self.users.insert(user.user_id, user.clone());
        Ok(())
    }

    /// Removes the user and, like the foreign key, all of their tokens
    fn remove_user(&mut self, user_id: &UserId) {
        if let Some(user) = self.users.remove(user_id) {
            self.emails.remove(user.email.as_str());
            self.tokens.retain(|_, t| t.user_id != *user_id);
        }
    }

    fn user_by_email(&self, email: &Email) -> Option<User> {
        self.emails
            .get(email.as_str())
            .and_then(|id| self.users.get(id))
            .cloned()
    }

    fn insert_token(&mut self, token: &RefreshToken) -> AuthResult<()> {
        if !self.users.contains_key(&token.user_id) {
            return Err(AuthError::Internal(format!(
                "Refresh token owner {} does not exist",
                token.user_id
            )));
        }
        if self.tokens.contains_key(&token.token_id) {
            return Err(AuthError::Internal(format!(
                "Duplicate refresh token id {}",
                token.token_id
            )));
        }
        self.tokens.insert(token.token_id, token.clone());
        Ok(())
    }

    fn tokens_of(&self, user_id: &UserId) -> Vec<RefreshToken> {
        let mut tokens: Vec<RefreshToken> = self
            .tokens
            .values()
            .filter(|t| t.user_id == *user_id)
            .cloned()
            .collect();
        tokens.sort_by_key(|t| t.created_at);
        tokens
    }

    fn remove_tokens_of(&mut self, user_id: &UserId) -> Vec<RefreshToken> {
        let ids: Vec<RefreshTokenId> = self
            .tokens
            .values()
            .filter(|t| t.user_id == *user_id)
            .map(|t| t.token_id)
            .collect();
        ids.iter().filter_map(|id| self.tokens.remove(id)).collect()
    }

    fn remove_expired(&mut self, now: DateTime<Utc>) -> Vec<RefreshToken> {
        let ids: Vec<RefreshTokenId> = self
            .tokens
            .values()
            .filter(|t| t.is_expired_at(now))
            .map(|t| t.token_id)
            .collect();
        ids.iter().filter_map(|id| self.tokens.remove(id)).collect()
    }
}

struct Inner {
    state: Mutex<State>,
    tx_lock: Arc<tokio::sync::Mutex<()>>,
}

/// In-memory auth store
#[derive(Clone)]
pub struct MemoryAuthStore {
    inner: Arc<Inner>,
}

impl Default for MemoryAuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                tx_lock: Arc::new(tokio::sync::Mutex::new(())),
            }),
        }
    }

    fn state(&self) -> AuthResult<MutexGuard<'_, State>> {
        self.inner
            .state
            .lock()
            .map_err(|_| AuthError::StoreUnavailable("memory store lock poisoned".to_string()))
    }

    /// State once no transaction is open
    async fn settled(&self) -> AuthResult<MutexGuard<'_, State>> {
        let _tx = self.inner.tx_lock.lock().await;
        self.state()
    }
}

// ============================================================================
// Repository Implementations
// ============================================================================

impl UserRepository for MemoryAuthStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        self.settled().await?.insert_user(user)
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self.settled().await?.user_by_email(email))
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.settled().await?.users.get(user_id).cloned())
    }
}

impl RefreshTokenRepository for MemoryAuthStore {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        self.settled().await?.insert_token(token)
    }

    async fn find_by_id(&self, token_id: &RefreshTokenId) -> AuthResult<Option<RefreshToken>> {
        Ok(self.settled().await?.tokens.get(token_id).cloned())
    }

    async fn find_all_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<RefreshToken>> {
        Ok(self.settled().await?.tokens_of(user_id))
    }

    async fn delete_by_id(&self, token_id: &RefreshTokenId) -> AuthResult<bool> {
        Ok(self.settled().await?.tokens.remove(token_id).is_some())
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> AuthResult<u64> {
        Ok(self.settled().await?.remove_tokens_of(user_id).len() as u64)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = self.settled().await?.remove_expired(now).len() as u64;
        tracing::info!(tokens_deleted = deleted, "Cleaned up expired refresh tokens");
        Ok(deleted)
    }
}

impl UnitOfWork for MemoryAuthStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> AuthResult<MemoryTransaction> {
        let guard = self.inner.tx_lock.clone().lock_owned().await;
        Ok(MemoryTransaction {
            store: self.clone(),
            journal: Mutex::new(Vec::new()),
            _guard: guard,
        })
    }
}

// ============================================================================
// Transaction
// ============================================================================

enum Undo {
    RemoveUser(UserId),
    RemoveToken(RefreshTokenId),
    RestoreToken(RefreshToken),
}

/// Open in-memory transaction
///
/// Writes are applied immediately and undone on rollback or drop. The
/// store-wide lock is held until then, so outside callers wait.
pub struct MemoryTransaction {
    store: MemoryAuthStore,
    journal: Mutex<Vec<Undo>>,
    _guard: OwnedMutexGuard<()>,
}

impl MemoryTransaction {
    fn record(&self, entries: impl IntoIterator<Item = Undo>) -> AuthResult<()> {
        self.journal
            .lock()
            .map_err(|_| AuthError::StoreUnavailable("transaction journal poisoned".to_string()))?
            .extend(entries);
        Ok(())
    }

    fn take_journal(&self) -> Vec<Undo> {
        match self.journal.lock() {
            Ok(mut journal) => std::mem::take(&mut *journal),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn undo(&self) -> AuthResult<()> {
        let journal = self.take_journal();
        if journal.is_empty() {
            return Ok(());
        }

        let mut state = self.store.state()?;
        for entry in journal.into_iter().rev() {
            match entry {
                Undo::RemoveUser(id) => state.remove_user(&id),
                Undo::RemoveToken(id) => {
                    state.tokens.remove(&id);
                }
                Undo::RestoreToken(token) => {
                    state.tokens.insert(token.token_id, token);
                }
            }
        }
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if let Err(e) = self.undo() {
            tracing::error!(error = %e, "Failed to roll back dropped memory transaction");
        }
    }
}

impl Transaction for MemoryTransaction {
    type Users = Self;
    type RefreshTokens = Self;

    fn users(&self) -> &Self {
        self
    }

    fn refresh_tokens(&self) -> &Self {
        self
    }

    async fn commit(self) -> AuthResult<()> {
        self.take_journal();
        Ok(())
    }

    async fn rollback(self) -> AuthResult<()> {
        self.undo()
    }
}

impl UserRepository for MemoryTransaction {
    async fn create(&self, user: &User) -> AuthResult<()> {
        self.store.state()?.insert_user(user)?;
        self.record([Undo::RemoveUser(user.user_id)])
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self.store.state()?.user_by_email(email))
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.store.state()?.users.get(user_id).cloned())
    }
}

impl RefreshTokenRepository for MemoryTransaction {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        self.store.state()?.insert_token(token)?;
        self.record([Undo::RemoveToken(token.token_id)])
    }

    async fn find_by_id(&self, token_id: &RefreshTokenId) -> AuthResult<Option<RefreshToken>> {
        Ok(self.store.state()?.tokens.get(token_id).cloned())
    }

    async fn find_all_by_user_id(&self, user_id: &UserId) -> AuthResult<Vec<RefreshToken>> {
        Ok(self.store.state()?.tokens_of(user_id))
    }

    async fn delete_by_id(&self, token_id: &RefreshTokenId) -> AuthResult<bool> {
        let removed = self.store.state()?.tokens.remove(token_id);
        let deleted = removed.is_some();
        self.record(removed.map(Undo::RestoreToken))?;
        Ok(deleted)
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> AuthResult<u64> {
        let removed = self.store.state()?.remove_tokens_of(user_id);
        let deleted = removed.len() as u64;
        self.record(removed.into_iter().map(Undo::RestoreToken))?;
        Ok(deleted)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let removed = self.store.state()?.remove_expired(now);
        let deleted = removed.len() as u64;
        self.record(removed.into_iter().map(Undo::RestoreToken))?;
        Ok(deleted)
    }
}
