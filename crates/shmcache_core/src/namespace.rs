//! Password namespaces.
//!
//! A [`Namespace`] is the resolved form of a password: its token (the key
//! in the root table) plus what is needed to check the salted verifier
//! stored alongside the namespace table. It is an explicit value the
//! caller passes around; nothing about the current password lives in
//! process-wide state.

use crate::error::{CacheError, CacheResult};
use crate::hash::{token_string, NamespaceHasher};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a verifier salt in bytes.
pub const SALT_LEN: usize = 16;

/// A resolved password namespace.
#[derive(Clone, PartialEq, Eq)]
pub struct Namespace {
    token: String,
    secret: Vec<u8>,
}

impl Namespace {
    /// Resolves a password into a namespace.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] if the password is empty or the
    /// hasher produces an empty digest. No segment I/O is involved.
    pub fn new(password: &str, hasher: &dyn NamespaceHasher) -> CacheResult<Self> {
        if password.is_empty() {
            return Err(CacheError::config("password must not be empty"));
        }

        let digest = hasher.digest(password.as_bytes());
        if digest.is_empty() {
            return Err(CacheError::config(format!(
                "namespace hasher {:?} returned an empty digest",
                hasher.name()
            )));
        }

        Ok(Self {
            token: token_string(hasher, &digest),
            secret: password.as_bytes().to_vec(),
        })
    }

    /// Returns the namespace token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Creates a fresh verifier with a random salt.
    pub(crate) fn new_verifier(&self) -> Verifier {
        let salt: [u8; SALT_LEN] = rand::random();
        Verifier {
            salt,
            digest: self.salted_digest(&salt),
        }
    }

    /// Returns true if `verifier` was made from this namespace's password.
    pub(crate) fn matches(&self, verifier: &Verifier) -> bool {
        self.salted_digest(&verifier.salt) == verifier.digest
    }

    fn salted_digest(&self, salt: &[u8; SALT_LEN]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(&self.secret);
        hasher.finalize().into()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Salted password digest stored with a namespace entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verifier {
    salt: [u8; SALT_LEN],
    digest: [u8; 32],
}

/// The scope an operation runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Unprotected names listed directly in the root table.
    Global,
    /// Names inside one password namespace.
    Namespace(Namespace),
}

impl Scope {
    /// Builds a scope from an optional password.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] for `Some("")`: a password was
    /// asked for but none given.
    pub fn from_password(password: Option<&str>, hasher: &dyn NamespaceHasher) -> CacheResult<Self> {
        match password {
            None => Ok(Self::Global),
            Some(password) => Namespace::new(password, hasher).map(Self::Namespace),
        }
    }

    /// Returns the namespace, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&Namespace> {
        match self {
            Self::Global => None,
            Self::Namespace(ns) => Some(ns),
        }
    }
}
