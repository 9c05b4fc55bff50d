//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Constant-time comparison helpers
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Signed access tokens (asymmetric JWT)
//! - Cookie and Authorization header handling

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod jwt;
pub mod password;
