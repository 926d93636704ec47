//! Destroy command implementation.

use super::{CliResult, Target};
use shmcache_core::{Config, DestroyOutcome};
use tracing::{info, warn};

/// Runs the destroy command.
pub fn run(target: &Target, password: Option<&str>, deep: bool) -> CliResult<()> {
    let cache = target.open_with(Config::new().deep_destroy(deep))?;
    let what = match password {
        Some(p) if !p.is_empty() => "namespace",
        _ => "cache",
    };

    info!(path = %target.path().display(), what, deep, "destroying");
    match cache.destroy(password)? {
        DestroyOutcome::NothingToDestroy => println!("nothing to destroy"),
        DestroyOutcome::Destroyed(report) => {
            println!("destroyed {what}: {} segment(s) removed", report.removed);
            if !report.is_complete() {
                warn!(failed = report.failed.len(), "teardown incomplete");
                println!("could not remove {} segment(s):", report.failed.len());
                for id in &report.failed {
                    println!("  {id}");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shmcache_core::HashAlgorithm;

    #[test]
    fn destroy_namespace_then_cache() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::new(Some(dir.path().to_path_buf()), HashAlgorithm::Sha256);
        {
            let cache = target.open().unwrap();
            cache.save("a", &1u8, Some("pw")).unwrap();
            cache.save("b", &2u8, None).unwrap();
        }

        run(&target, Some("pw"), false).unwrap();
        let cache = target.open().unwrap();
        assert_eq!(cache.read::<u8>("a", Some("pw")).unwrap(), None);
        assert_eq!(cache.read::<u8>("b", None).unwrap(), Some(2));

        run(&target, None, true).unwrap();
        assert!(cache.store().list().unwrap().is_empty());
    }
}
