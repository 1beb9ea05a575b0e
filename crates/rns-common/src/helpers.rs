//! Common helper functions for RNS.

/// Performs a constant-time comparison of two byte slices.
///
/// Used when checking decrypted key material against a claimed value, so
/// the comparison time does not depend on where the first mismatch is.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (lhs, rhs) in a.iter().zip(b.iter()) {
        diff |= lhs ^ rhs;
    }
    diff == 0
}
