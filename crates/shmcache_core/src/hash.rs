//! Namespace hash functions.
//!
//! A password is never stored in the root table as-is. It is hashed
//! into a namespace token, and the token is the key under which the
//! namespace's table is recorded.
//!
//! Two passwords whose digests collide map to the same token. The
//! default SHA-256 hasher makes that practically impossible; the CRC-32
//! hasher reproduces the short tokens of older deployments and collides
//! readily, which is why namespaces also carry a verifier (see
//! [`crate::Namespace`]).

use sha2::{Digest, Sha256};
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

/// A deterministic function from password bytes to a digest.
///
/// Implementations must return the same non-empty digest for the same
/// input on every call and in every process sharing a cache.
pub trait NamespaceHasher: Send + Sync + fmt::Debug {
    /// Short name prefixed to tokens, e.g. `"sha256"`.
    fn name(&self) -> &str;

    /// Hashes the password.
    fn digest(&self, password: &[u8]) -> Vec<u8>;
}

/// SHA-256 hasher (the default).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl NamespaceHasher for Sha256Hasher {
    fn name(&self) -> &str {
        "sha256"
    }

    fn digest(&self, password: &[u8]) -> Vec<u8> {
        Sha256::digest(password).to_vec()
    }
}

/// CRC-32 (IEEE) hasher, for compatibility with short legacy tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Hasher;

impl NamespaceHasher for Crc32Hasher {
    fn name(&self) -> &str {
        "crc32"
    }

    fn digest(&self, password: &[u8]) -> Vec<u8> {
        crc32(password).to_be_bytes().to_vec()
    }
}

/// Built-in hash functions selectable from [`crate::Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    /// [`Sha256Hasher`].
    #[default]
    Sha256,
    /// [`Crc32Hasher`].
    Crc32,
}

impl HashAlgorithm {
    /// Returns the hasher for this algorithm.
    #[must_use]
    pub fn hasher(self) -> Arc<dyn NamespaceHasher> {
        match self {
            Self::Sha256 => Arc::new(Sha256Hasher),
            Self::Crc32 => Arc::new(Crc32Hasher),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "crc32" => Ok(Self::Crc32),
            other => Err(format!("unknown hash algorithm: {other}")),
        }
    }
}

/// Renders `name:hexdigest`.
pub(crate) fn token_string(hasher: &dyn NamespaceHasher, digest: &[u8]) -> String {
    let mut token = String::with_capacity(hasher.name().len() + 1 + digest.len() * 2);
    token.push_str(hasher.name());
    token.push(':');
    for byte in digest {
        let _ = write!(token, "{byte:02x}");
    }
    token
}

/// CRC-32 with the IEEE polynomial.
fn crc32(data: &[u8]) -> u32 {
    const TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        crc = (crc >> 8) ^ TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize];
    }
    !crc
}
