//! Refresh Token Identifier
//!
//! The id is the bearer credential handed to the client (in a cookie), so it
//! must be unguessable: always a fresh UUIDv4 from the OS RNG.

use kernel::id::{Id, markers};

pub type RefreshTokenId = Id<markers::RefreshToken>;

/// Parse a client-supplied token id
///
/// Any malformed input is simply "not a token we know".
pub fn parse_refresh_token_id(raw: &str) -> Option<RefreshTokenId> {
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        let id = RefreshTokenId::new();
        assert_eq!(parse_refresh_token_id(&id.to_string()), Some(id));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_refresh_token_id(""), None);
        assert_eq!(parse_refresh_token_id("not-a-uuid"), None);
        assert_eq!(parse_refresh_token_id("1; DROP TABLE refresh_tokens"), None);
    }
}
