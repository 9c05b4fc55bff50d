//! Domain Layer
//!
//! Contains entities, value objects, repository traits and the refresh
//! token factory.

pub mod entity;
pub mod repository;
pub mod services;
pub mod value_object;

// Re-exports
pub use entity::{refresh_token::RefreshToken, user::User};
pub use repository::{RefreshTokenRepository, Transaction, UnitOfWork, UserRepository};
pub use services::RefreshTokenFactory;
