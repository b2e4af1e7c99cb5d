//! Short content hashes used in generated resource names.

use sha2::{Digest, Sha256};

/// Hex characters kept from a digest when it becomes part of a name.
pub const SHORT_HASH_LEN: usize = 5;

/// SHA-256 of `bytes` as a lowercase hex string.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over `parts`, truncated to [`SHORT_HASH_LEN`] hex characters.
///
/// Parts are length-prefixed so that `["ab", "c"]` and `["a", "bc"]`
/// hash differently.
pub fn short_hash<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        let part = part.as_ref();
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(SHORT_HASH_LEN);
    digest
}
