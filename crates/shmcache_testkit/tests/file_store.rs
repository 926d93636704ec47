//! Tests against the file-backed segment store.

use shmcache_core::{CacheError, Config, Permissions};
use shmcache_storage::SegmentStore;
use shmcache_testkit::{
    missing_after_concurrent_saves, stress_concurrent_handles, StressConfig, TestCache,
};
use std::time::Duration;

#[test]
fn values_persist_across_handles() {
    let test_cache = TestCache::file();
    test_cache.save("plain", &1u32, None).unwrap();
    test_cache.save("secret", &2u32, Some("pw")).unwrap();

    let other = test_cache.reopen();
    assert_eq!(other.read::<u32>("plain", None).unwrap(), Some(1));
    assert_eq!(other.read::<u32>("secret", Some("pw")).unwrap(), Some(2));

    other.destroy(Some("pw")).unwrap();
    assert_eq!(test_cache.read::<u32>("secret", Some("pw")).unwrap(), None);
}

#[test]
fn segment_files_carry_permissions() {
    let test_cache = TestCache::file();
    let id = test_cache
        .save_with_permissions("private", &1u8, None, Permissions::PRIVATE)
        .unwrap();
    assert_eq!(test_cache.store().permissions(id).unwrap(), Permissions::PRIVATE);
}

#[test]
fn concurrent_handles_lose_no_updates() {
    let test_cache = TestCache::file();
    let config = StressConfig {
        operations: 25,
        threads: 4,
        password: Some("shared".to_string()),
    };

    let result = stress_concurrent_handles(
        test_cache.path().unwrap(),
        &Config::new().lock_timeout(Duration::from_secs(30)),
        &config,
    )
    .unwrap();

    assert_eq!(result.failed_ops, 0);
    assert_eq!(result.successful_ops, 100);
    assert!(missing_after_concurrent_saves(&test_cache, &config).is_empty());
    assert_eq!(test_cache.names(Some("shared")).unwrap().len(), 100);
    assert!(test_cache.verify().unwrap().is_ok());
}

#[test]
fn held_lock_times_out() {
    let test_cache = TestCache::file_with_config(Config::new().lock_timeout(Duration::from_millis(50)));
    let other = test_cache.reopen();

    let _guard = other.store().lock(Duration::from_secs(1)).unwrap();
    let result = test_cache.save("k", &1u8, None);
    assert!(matches!(result, Err(CacheError::LockTimeout { .. })));
}

#[test]
fn teardown_is_best_effort() {
    let test_cache = TestCache::file();
    let stuck = test_cache
        .save_with_permissions("stuck", &1u8, None, Permissions::READ_ONLY)
        .unwrap();
    test_cache.save("gone", &2u8, None).unwrap();

    let outcome = test_cache.destroy(None).unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.failed, vec![stuck]);
    assert_eq!(test_cache.read::<u8>("gone", None).unwrap(), None);
    assert!(test_cache.store().exists(stuck).unwrap());
}
