//! Scenario tests for the cache contract.

use shmcache_core::{CacheError, Config, DestroyOutcome, ROOT_TABLE_ID};
use shmcache_testkit::{scenarios, CollidingHasher, TestCache};
use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn round_trip_structured_value() {
    let cache = TestCache::memory();
    let value = vec![("x".to_string(), 1i32), ("y".to_string(), -2)];
    cache.save("pairs", &value, None).unwrap();
    assert_eq!(cache.read::<Vec<(String, i32)>>("pairs", None).unwrap(), Some(value));
}

#[test]
fn namespaces_do_not_leak_into_plain_names() {
    let cache = TestCache::memory();
    cache.save("n", &1u8, Some("p1")).unwrap();
    cache.save("n", &2u8, Some("p2")).unwrap();

    assert_eq!(cache.read::<u8>("n", Some("p1")).unwrap(), Some(1));
    assert_eq!(cache.read::<u8>("n", Some("p2")).unwrap(), Some(2));
    assert_eq!(cache.read::<u8>("n", None).unwrap(), None);
}

#[test]
fn delete_removes_visibility_in_each_scope() {
    let cache = TestCache::memory();
    for scope in [None, Some("pw")] {
        cache.save("d", &1u8, scope).unwrap();
        assert!(cache.delete("d", scope).unwrap());
        assert_eq!(cache.read::<u8>("d", scope).unwrap(), None);
    }
}

#[test]
fn destroy_twice_reports_nothing_the_second_time() {
    let cache = scenarios::populated_cache(5);
    assert!(matches!(cache.destroy(None).unwrap(), DestroyOutcome::Destroyed(_)));
    assert_eq!(cache.destroy(None).unwrap(), DestroyOutcome::NothingToDestroy);
    assert!(cache.store().list().unwrap().is_empty());
}

#[test]
fn namespace_destroy_keeps_plain_names() {
    let cache = TestCache::memory();
    cache.save("a", &1u32, Some("pw")).unwrap();
    cache.save("b", &2u32, None).unwrap();

    let outcome = cache.destroy(Some("pw")).unwrap();
    assert!(outcome.report().unwrap().is_complete());

    assert_eq!(cache.read::<u32>("a", Some("pw")).unwrap(), None);
    assert_eq!(cache.read::<u32>("b", None).unwrap(), Some(2));
    assert!(cache.destroy(Some("pw")).unwrap().is_nothing());
}

#[test]
fn sequential_saves_get_distinct_ids() {
    let cache = TestCache::memory();
    let ids: Vec<_> = (0..200)
        .map(|i| cache.save(&format!("n{i}"), &i, Some("pw")).unwrap())
        .collect();

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
    assert!(!ids.contains(&ROOT_TABLE_ID));
}

#[test]
fn ids_stay_distinct_after_deletes() {
    let cache = TestCache::memory();
    for i in 0..10 {
        cache.save(&format!("n{i}"), &i, None).unwrap();
    }
    for i in (0..10).step_by(2) {
        cache.delete(&format!("n{i}"), None).unwrap();
    }
    for i in 10..20 {
        cache.save(&format!("n{i}"), &i, None).unwrap();
    }
    for i in (1..20).filter(|i| i % 2 == 1 || *i >= 10) {
        assert_eq!(cache.read::<i32>(&format!("n{i}"), None).unwrap(), Some(i), "n{i}");
    }
}

#[test]
fn global_wipe_hides_everything() {
    let cache = scenarios::multi_namespace_cache(&["a", "b", "c"]);
    cache.save("plain", &1u8, None).unwrap();

    cache.destroy(None).unwrap();

    assert_eq!(cache.read::<u8>("plain", None).unwrap(), None);
    for p in ["a", "b", "c"] {
        assert_eq!(cache.read::<usize>("value", Some(p)).unwrap(), None);
    }
    let inventory = cache.inventory().unwrap();
    assert!(!inventory.initialized);
}

#[test]
fn shallow_wipe_leaves_orphans_deep_wipe_does_not() {
    let shallow = scenarios::multi_namespace_cache(&["a", "b"]);
    shallow.destroy(None).unwrap();
    // one value per namespace survives as an unreferenced segment
    assert_eq!(shallow.store().list().unwrap().len(), 2);

    let deep = TestCache::memory_with_config(Config::new().deep_destroy(true));
    deep.save("value", &0usize, Some("a")).unwrap();
    deep.save("value", &1usize, Some("b")).unwrap();
    deep.destroy(None).unwrap();
    assert!(deep.store().list().unwrap().is_empty());
}

#[test]
fn colliding_password_rejected_when_verified() {
    let cache = TestCache::memory().with_hasher(Arc::new(CollidingHasher));
    cache.save("k", &1u8, Some("owner")).unwrap();

    let err = cache.read::<u8>("k", Some("intruder")).unwrap_err();
    assert!(matches!(err, CacheError::NamespaceCollision { .. }));
    assert!(matches!(
        cache.save("k", &2u8, Some("intruder")),
        Err(CacheError::NamespaceCollision { .. })
    ));
    assert!(matches!(
        cache.destroy(Some("intruder")),
        Err(CacheError::NamespaceCollision { .. })
    ));
    assert_eq!(cache.read::<u8>("k", Some("owner")).unwrap(), Some(1));
}

#[test]
fn colliding_password_shares_namespace_when_unverified() {
    let cache = TestCache::memory_with_config(Config::new().verify_namespaces(false))
        .with_hasher(Arc::new(CollidingHasher));
    cache.save("k", &1u8, Some("owner")).unwrap();
    assert_eq!(cache.read::<u8>("k", Some("intruder")).unwrap(), Some(1));
}

#[test]
fn name_that_looks_like_a_token_is_still_plain() {
    let cache = TestCache::memory();
    let token = cache.scoped(Some("pw")).unwrap().token().unwrap().to_string();
    cache.save(&token, &"plain", None).unwrap();
    cache.save("inside", &"secret", Some("pw")).unwrap();

    assert_eq!(cache.read::<String>(&token, None).unwrap().as_deref(), Some("plain"));
    assert_eq!(cache.read::<String>("inside", Some("pw")).unwrap().as_deref(), Some("secret"));
    assert!(cache.verify().unwrap().is_ok());
}

#[test]
fn empty_password_fails_before_io() {
    let cache = TestCache::memory();
    assert!(matches!(cache.save("k", &1u8, Some("")), Err(CacheError::Config { .. })));
    assert!(matches!(cache.read::<u8>("k", Some("")), Err(CacheError::Config { .. })));
    assert!(cache.store().list().unwrap().is_empty());
}
