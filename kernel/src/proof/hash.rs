//! Content hashing: SHA-256 with domain separation.
//!
//! Every digest in the workspace is `canonical_hash(domain, bytes)`,
//! rendered as `"sha256:<64 lowercase hex>"`. Manifest digests, registry
//! digests and the digest file a host writes next to a manifest all use this
//! one function and this one text form.

use sha2::{Digest, Sha256};

use crate::proof::hash_domain::HashDomain;

/// Algorithm tag written before the `:` of every digest this crate emits.
pub const HASH_ALGORITHM: &str = "sha256";

/// A digest in `"<algorithm>:<lowercase hex>"` text form.
///
/// Parsed digests may name any algorithm, so a digest file from a future
/// scheme decodes and then simply fails to compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash {
    text: String,
    algorithm_len: usize,
}

impl ContentHash {
    /// Parse `"<algorithm>:<hex>"`.
    ///
    /// `None` unless there is exactly one `:`, the algorithm is non-empty,
    /// and the digest is non-empty lowercase hex of even length.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (algorithm, digest) = s.split_once(':')?;
        let hex_ok = !digest.is_empty()
            && digest.len() % 2 == 0
            && digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if algorithm.is_empty() || !hex_ok {
            return None;
        }
        Some(Self {
            text: s.to_string(),
            algorithm_len: algorithm.len(),
        })
    }

    /// Algorithm tag, e.g. `"sha256"`.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.text[..self.algorithm_len]
    }

    /// Hex digest after the `:`.
    #[must_use]
    pub fn hex_digest(&self) -> &str {
        &self.text[self.algorithm_len + 1..]
    }

    /// Full text form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// `sha256(domain.as_bytes() || data)`.
#[must_use]
pub fn canonical_hash(domain: HashDomain, data: &[u8]) -> ContentHash {
    let digest = Sha256::new()
        .chain_update(domain.as_bytes())
        .chain_update(data)
        .finalize();
    ContentHash {
        text: format!("{HASH_ALGORITHM}:{}", hex::encode(digest)),
        algorithm_len: HASH_ALGORITHM.len(),
    }
}
