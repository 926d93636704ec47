//! Property-based test generators using proptest.
//!
//! Provides strategies for names, passwords, values and operation
//! sequences. Operation strategies draw from small pools so that
//! generated sequences actually revisit the same names and namespaces.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};

/// A structured value to store in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Free text.
    pub label: String,
    /// A signed counter.
    pub count: i64,
    /// Optional flag.
    pub flag: Option<bool>,
    /// A list of small integers.
    pub samples: Vec<u16>,
}

/// Strategy for generating cache names, including ones that look like
/// namespace tokens.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::string::string_regex("[a-zA-Z0-9_.:/-]{1,24}").expect("Invalid regex"),
        1 => prop::string::string_regex("sha256:[0-9a-f]{8}").expect("Invalid regex"),
        1 => Just(String::new()),
    ]
}

/// Strategy for generating non-empty passwords.
pub fn password_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{1,20}").expect("Invalid regex")
}

/// Strategy for generating two different passwords.
pub fn distinct_passwords_strategy() -> impl Strategy<Value = (String, String)> {
    (password_strategy(), password_strategy()).prop_filter("Passwords must differ", |(a, b)| a != b)
}

/// Strategy for generating payloads.
pub fn payload_strategy() -> impl Strategy<Value = Payload> {
    (
        ".{0,32}",
        any::<i64>(),
        any::<Option<bool>>(),
        prop::collection::vec(any::<u16>(), 0..16),
    )
        .prop_map(|(label, count, flag, samples)| Payload {
            label,
            count,
            flag,
            samples,
        })
}

/// One step of a generated cache workload.
#[derive(Debug, Clone)]
pub enum CacheOperation {
    /// Save a value.
    Save {
        /// Name to save under.
        name: String,
        /// Namespace password.
        password: Option<String>,
        /// Value to save.
        value: Payload,
    },
    /// Read a value.
    Read {
        /// Name to read.
        name: String,
        /// Namespace password.
        password: Option<String>,
    },
    /// Delete a value.
    Delete {
        /// Name to delete.
        name: String,
        /// Namespace password.
        password: Option<String>,
    },
    /// Destroy a namespace, or everything when `password` is `None`.
    Destroy {
        /// Namespace password.
        password: Option<String>,
    },
}

fn pooled_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d", "e"]).prop_map(String::from)
}

fn pooled_password() -> impl Strategy<Value = Option<String>> {
    prop::sample::select(vec![None, Some("p1"), Some("p2"), Some("p3")])
        .prop_map(|p| p.map(String::from))
}

/// Strategy for generating cache operations.
pub fn cache_operation_strategy() -> impl Strategy<Value = CacheOperation> {
    prop_oneof![
        6 => (pooled_name(), pooled_password(), payload_strategy())
            .prop_map(|(name, password, value)| CacheOperation::Save { name, password, value }),
        4 => (pooled_name(), pooled_password())
            .prop_map(|(name, password)| CacheOperation::Read { name, password }),
        2 => (pooled_name(), pooled_password())
            .prop_map(|(name, password)| CacheOperation::Delete { name, password }),
        1 => pooled_password().prop_map(|password| CacheOperation::Destroy { password }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<CacheOperation>> {
    prop::collection::vec(cache_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn passwords_are_non_empty(password in password_strategy()) {
            prop_assert!(!password.is_empty());
        }

        #[test]
        fn distinct_passwords_differ((a, b) in distinct_passwords_strategy()) {
            prop_assert_ne!(a, b);
        }

        #[test]
        fn payloads_survive_the_codec(payload in payload_strategy()) {
            let bytes = shmcache_codec::encode(shmcache_codec::SegmentKind::Value, &payload).unwrap();
            let back: Payload = shmcache_codec::decode(shmcache_codec::SegmentKind::Value, &bytes).unwrap();
            prop_assert_eq!(back, payload);
        }
    }
}
