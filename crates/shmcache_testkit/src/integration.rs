//! Model-checking harness.
//!
//! Applies operations to a real cache and to a plain in-memory model in
//! lockstep, asserting after each step that the two agree.

use crate::fixtures::TestCache;
use crate::generators::{CacheOperation, Payload};
use shmcache_core::SharedCache;
use std::collections::{BTreeMap, BTreeSet};

type Key = (Option<String>, String);

/// A cache paired with the state it is expected to hold.
pub struct ModelHarness {
    /// The cache under test.
    pub cache: TestCache,
    values: BTreeMap<Key, Payload>,
    namespaces: BTreeSet<String>,
    initialized: bool,
}

impl ModelHarness {
    /// Creates a harness over an in-memory cache.
    pub fn new() -> Self {
        Self::with_cache(TestCache::memory())
    }

    /// Creates a harness over an existing, empty test cache.
    pub fn with_cache(cache: TestCache) -> Self {
        Self {
            cache,
            values: BTreeMap::new(),
            namespaces: BTreeSet::new(),
            initialized: false,
        }
    }

    /// Returns the cache handle.
    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Applies one operation to both sides and checks its result.
    pub fn apply(&mut self, op: &CacheOperation) {
        match op {
            CacheOperation::Save {
                name,
                password,
                value,
            } => self.save(name, password.as_deref(), value),
            CacheOperation::Read { name, password } => {
                self.read_and_verify(name, password.as_deref());
            }
            CacheOperation::Delete { name, password } => self.delete(name, password.as_deref()),
            CacheOperation::Destroy { password } => self.destroy(password.as_deref()),
        }
    }

    /// Saves a value and tracks it.
    pub fn save(&mut self, name: &str, password: Option<&str>, value: &Payload) {
        self.cache
            .save(name, value, password)
            .expect("Failed to save value");
        if let Some(p) = password {
            self.namespaces.insert(p.to_string());
        }
        self.initialized = true;
        self.values.insert(key(name, password), value.clone());
    }

    /// Reads a value and asserts it matches the model.
    pub fn read_and_verify(&self, name: &str, password: Option<&str>) -> Option<Payload> {
        let actual: Option<Payload> = self.cache.read(name, password).expect("Failed to read value");
        assert_eq!(
            actual.as_ref(),
            self.values.get(&key(name, password)),
            "Value mismatch for {name:?} in {password:?}"
        );
        actual
    }

    /// Deletes a value and asserts the reported result.
    pub fn delete(&mut self, name: &str, password: Option<&str>) {
        let removed = self.cache.delete(name, password).expect("Failed to delete value");
        let expected = self.values.remove(&key(name, password)).is_some();
        assert_eq!(removed, expected, "Delete result mismatch for {name:?} in {password:?}");
    }

    /// Destroys a namespace or everything and asserts the outcome.
    pub fn destroy(&mut self, password: Option<&str>) {
        let outcome = self.cache.destroy(password).expect("Failed to destroy");
        match password {
            Some(p) => {
                let existed = self.namespaces.remove(p);
                assert_eq!(!outcome.is_nothing(), existed, "Destroy outcome mismatch for {p:?}");
                self.values.retain(|(scope, _), _| scope.as_deref() != Some(p));
            }
            None => {
                assert_eq!(!outcome.is_nothing(), self.initialized, "Wipe outcome mismatch");
                self.values.clear();
                self.namespaces.clear();
                self.initialized = false;
            }
        }
    }

    /// Verifies every tracked value and every scope's name list.
    pub fn verify_all(&self) {
        for (scope, name) in self.values.keys() {
            self.read_and_verify(name, scope.as_deref());
        }

        let scopes = std::iter::once(None).chain(self.namespaces.iter().map(|p| Some(p.as_str())));
        for scope in scopes {
            let expected: Vec<String> = self
                .values
                .keys()
                .filter(|(s, _)| s.as_deref() == scope)
                .map(|(_, name)| name.clone())
                .collect();
            let actual = self.cache.names(scope).expect("Failed to list names");
            assert_eq!(actual, expected, "Name list mismatch in {scope:?}");
        }
    }

    /// Returns the count of tracked values.
    pub fn tracked_count(&self) -> usize {
        self.values.len()
    }
}

impl Default for ModelHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn key(name: &str, password: Option<&str>) -> Key {
    (password.map(String::from), name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(count: i64) -> Payload {
        Payload {
            label: "x".into(),
            count,
            flag: None,
            samples: vec![1, 2],
        }
    }

    #[test]
    fn harness_tracks_saves_and_deletes() {
        let mut harness = ModelHarness::new();
        harness.save("a", None, &payload(1));
        harness.save("a", Some("pw"), &payload(2));
        assert_eq!(harness.tracked_count(), 2);

        harness.delete("a", None);
        harness.delete("a", None);
        harness.verify_all();
    }

    #[test]
    fn harness_tracks_destroys() {
        let mut harness = ModelHarness::new();
        harness.destroy(None);
        harness.save("a", Some("pw"), &payload(1));
        harness.save("b", None, &payload(2));
        harness.destroy(Some("pw"));
        harness.destroy(Some("pw"));
        harness.verify_all();
        harness.destroy(None);
        harness.destroy(None);
        assert_eq!(harness.tracked_count(), 0);
    }
}
