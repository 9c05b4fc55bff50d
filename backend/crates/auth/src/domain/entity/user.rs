//! User Entity
//!
//! Login identity: email plus password hash. Created on signup and never
//! mutated by the session subsystem afterwards.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::{email::Email, user_id::UserId};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Unique login email (normalised)
    pub email: Email,
    /// Argon2id PHC string
    pub password_hash: HashedPassword,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh id
    pub fn new(email: Email, password_hash: HashedPassword) -> Self {
        Self {
            user_id: UserId::new(),
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}
