//! Stress tests for shmcache.
//!
//! These drive one cache hard from a single handle, or drive several
//! handles on the same segment directory from separate threads to
//! exercise the advisory lock.

use crate::generators::Payload;
use shmcache_core::{CacheResult, Config, SharedCache};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        Self {
            total_ops: successful + failed,
            successful_ops: successful,
            failed_ops: failed,
            duration,
        }
    }

    /// Operations per second.
    pub fn ops_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.total_ops as f64 / secs
        } else {
            0.0
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of concurrent handles.
    pub threads: usize,
    /// Namespace password, or `None` for plain names.
    pub password: Option<String>,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 200,
            threads: 4,
            password: Some("stress".to_string()),
        }
    }
}

/// Name written by thread `t` in step `i`.
pub fn stress_name(t: usize, i: usize) -> String {
    format!("t{t}-{i}")
}

fn payload(t: usize, i: usize) -> Payload {
    Payload {
        label: stress_name(t, i),
        count: i as i64,
        flag: Some(t % 2 == 0),
        samples: vec![t as u16, i as u16],
    }
}

/// Saves `config.operations` distinct names from one handle, then
/// overwrites each of them with a second value.
pub fn stress_sequential_saves(cache: &SharedCache, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for round in 0..2 {
        for i in 0..config.operations {
            match cache.save(&stress_name(0, i), &payload(round, i), config.password.as_deref()) {
                Ok(_) => successful += 1,
                Err(_) => failed += 1,
            }
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Opens one handle per thread on `dir` and has each save its own names
/// into a shared scope.
///
/// With locking on, every save must be visible afterwards; see
/// [`missing_after_concurrent_saves`].
pub fn stress_concurrent_handles(
    dir: &Path,
    cache_config: &Config,
    config: &StressConfig,
) -> CacheResult<StressTestResult> {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));

    let handles = (0..config.threads)
        .map(|t| -> CacheResult<thread::JoinHandle<()>> {
            let cache = SharedCache::open_with_config(dir, cache_config.clone())?;
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let operations = config.operations;
            let password = config.password.clone();

            Ok(thread::spawn(move || {
                for i in 0..operations {
                    match cache.save(&stress_name(t, i), &payload(t, i), password.as_deref()) {
                        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            }))
        })
        .collect::<CacheResult<Vec<_>>>()?;

    let start = Instant::now();
    for handle in handles {
        handle.join().expect("Stress thread panicked");
    }

    Ok(StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    ))
}

/// Returns the names written by [`stress_concurrent_handles`] that did
/// not survive, i.e. lost updates.
pub fn missing_after_concurrent_saves(cache: &SharedCache, config: &StressConfig) -> Vec<String> {
    let mut missing = Vec::new();
    for t in 0..config.threads {
        for i in 0..config.operations {
            let name = stress_name(t, i);
            let value: Option<Payload> = cache
                .read(&name, config.password.as_deref())
                .expect("Failed to read value");
            if value != Some(payload(t, i)) {
                missing.push(name);
            }
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestCache;

    #[test]
    fn sequential_saves_succeed() {
        let test_cache = TestCache::memory();
        let config = StressConfig {
            operations: 50,
            ..StressConfig::default()
        };
        let result = stress_sequential_saves(&test_cache, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 100);
        assert_eq!(test_cache.names(Some("stress")).unwrap().len(), 50);
        let last: Option<Payload> = test_cache.read(&stress_name(0, 7), Some("stress")).unwrap();
        assert_eq!(last, Some(payload(1, 7)));
    }
}
