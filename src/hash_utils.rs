//! Hash utilities for the integrity anchor
//!
//! The registry anchors every record to the SHA-256 of the canonical original
//! bytes; everything here works on that digest in lowercase hex form.

use sha2::{Digest, Sha256};

/// Computes the lowercase hex SHA-256 digest of a byte slice.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Normalizes a user-supplied digest string: trims surrounding whitespace and
/// case-folds to lowercase hex.
pub fn normalize_digest(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Whether a string is a well-formed SHA-256 hex digest.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Case-insensitive digest equality with a constant shape: after the length
/// check every byte is folded into the accumulator, with no early exit.
pub fn digests_match(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x.to_ascii_lowercase() ^ y.to_ascii_lowercase();
    }
    diff == 0
}
