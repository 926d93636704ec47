//! Property tests: random workloads checked against a plain model.

use proptest::prelude::*;
use shmcache_testkit::{operation_sequence_strategy, ModelHarness, PropTestConfig, TestCache};

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn memory_cache_matches_model(ops in operation_sequence_strategy(1, 60)) {
        let mut harness = ModelHarness::new();
        for op in &ops {
            harness.apply(op);
        }
        harness.verify_all();
        prop_assert!(harness.cache().verify().unwrap().findings.iter().all(|f| !f.is_error()));
    }

    #[test]
    fn file_cache_matches_model(ops in operation_sequence_strategy(1, 30)) {
        let mut harness = ModelHarness::with_cache(TestCache::file());
        for op in &ops {
            harness.apply(op);
        }
        harness.verify_all();
    }
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn any_name_round_trips(
        name in shmcache_testkit::name_strategy(),
        password in proptest::option::of(shmcache_testkit::password_strategy()),
        value in shmcache_testkit::payload_strategy(),
    ) {
        let cache = TestCache::memory();
        cache.save(&name, &value, password.as_deref()).unwrap();
        prop_assert_eq!(cache.read::<shmcache_testkit::Payload>(&name, password.as_deref()).unwrap(), Some(value));
    }

    #[test]
    fn distinct_passwords_are_isolated(
        (p1, p2) in shmcache_testkit::distinct_passwords_strategy(),
        name in shmcache_testkit::name_strategy(),
    ) {
        let cache = TestCache::memory();
        cache.save(&name, &1u8, Some(p1.as_str())).unwrap();
        cache.save(&name, &2u8, Some(p2.as_str())).unwrap();
        prop_assert_eq!(cache.read::<u8>(&name, Some(p1.as_str())).unwrap(), Some(1));
        prop_assert_eq!(cache.read::<u8>(&name, Some(p2.as_str())).unwrap(), Some(2));
        prop_assert_eq!(cache.read::<u8>(&name, None).unwrap(), None);
    }
}
