//! Value Object Module

pub mod email;
pub mod fingerprint;
pub mod refresh_token_id;
pub mod user_id;

pub use email::Email;
pub use fingerprint::Fingerprint;
pub use refresh_token_id::{RefreshTokenId, parse_refresh_token_id};
pub use user_id::UserId;
