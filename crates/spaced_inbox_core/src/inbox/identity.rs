//! Content identity for note text.
//!
//! # Invariants
//! - The digest is computed over the UTF-8 bytes of already-normalized text
//!   (trimmed, reaction lines removed); callers must not hash raw chunks.
//! - Output is lowercase hex SHA-256, 64 characters.

use crate::model::note::Fingerprint;
use sha2::{Digest, Sha256};

/// Length of a rendered fingerprint in hex characters.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Returns the stable fingerprint for reviewable note text.
pub fn fingerprint(text: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Returns a short prefix of a fingerprint for log lines.
pub fn short_fingerprint(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
