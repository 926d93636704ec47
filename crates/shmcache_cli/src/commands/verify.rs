//! Verify command implementation.

use super::{CliError, CliResult, Target};
use tracing::info;

/// Runs the verify command.
pub fn run(target: &Target) -> CliResult<()> {
    println!("Verifying cache at {:?}", target.path());
    println!();

    let cache = target.open()?;
    let report = cache.verify()?;
    info!(
        segments = report.segments_checked,
        findings = report.findings.len(),
        "verification finished"
    );

    println!("Segments checked: {}", report.segments_checked);
    for finding in &report.findings {
        let level = if finding.is_error() { "ERROR" } else { "note" };
        println!("  {level}: {finding}");
    }
    println!();

    if report.is_ok() {
        println!("Cache is consistent.");
        Ok(())
    } else {
        let errors = report.findings.iter().filter(|f| f.is_error()).count();
        Err(CliError::VerifyFailed(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shmcache_core::HashAlgorithm;

    #[test]
    fn verify_fails_on_dangling_entry() {
        let dir = tempfile::tempdir().unwrap();
        let target = Target::new(Some(dir.path().to_path_buf()), HashAlgorithm::Sha256);
        let cache = target.open().unwrap();
        let id = cache.save("k", &1u8, None).unwrap();
        run(&target).unwrap();

        cache.store().delete(id).unwrap();
        assert!(matches!(run(&target), Err(CliError::VerifyFailed(1))));
    }
}
