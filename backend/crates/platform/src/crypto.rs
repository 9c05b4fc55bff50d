//! Cryptographic Utilities

/// Constant-time comparison to prevent timing attacks
///
/// Length is not secret: inputs of different length return early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"device-1", b"device-1"));
        assert!(!constant_time_eq(b"device-1", b"device-2"));
        assert!(!constant_time_eq(b"short", b"longer value"));
        assert!(constant_time_eq(b"", b""));
    }
}
