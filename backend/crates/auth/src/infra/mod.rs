//! Infrastructure Layer
//!
//! Store implementations of the repository and unit-of-work traits.

pub mod memory;
pub mod postgres;

pub use memory::{MemoryAuthStore, MemoryTransaction};
pub use postgres::{PgAuthRepository, PgTransaction};
