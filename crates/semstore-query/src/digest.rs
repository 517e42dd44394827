//! Fingerprint digests for query descriptions.
//!
//! Fingerprints are used as cache keys and for deduplicating disjuncts, so
//! they must be stable across runs and platforms:
//!
//! - algorithm: **SHA-256**, truncated to the first 16 bytes
//! - input: a `|`-separated list of components chosen by each node
//! - output: `"<prefix>:<32 lowercase hex digits>"`
//!
//! The digest is not a security primitive. Truncation keeps keys short while
//! keeping accidental collisions out of reach for realistic query sizes.

use sha2::{Digest as _, Sha256};
use std::fmt::Write as _;

/// Number of digest bytes kept in a fingerprint.
pub const FINGERPRINT_BYTES: usize = 16;

/// Hex-encode the truncated SHA-256 of `s`.
pub fn short_hash(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(FINGERPRINT_BYTES * 2);
    for b in digest[..FINGERPRINT_BYTES].iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Compute a prefixed fingerprint over ordered components.
///
/// Components are joined with `|`; callers that need order-insensitivity sort
/// their components before calling.
pub fn fingerprint_of<I, S>(prefix: &str, components: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for (i, c) in components.into_iter().enumerate() {
        if i > 0 {
            text.push('|');
        }
        text.push_str(c.as_ref());
    }
    format!("{prefix}:{}", short_hash(&text))
}
