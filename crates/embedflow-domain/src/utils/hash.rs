//! Content hashing.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a string. Used to derive content-addressed global
/// ids from user-facing data-source keys.
#[must_use]
pub fn content_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
