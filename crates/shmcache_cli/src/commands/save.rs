//! Save command implementation.

use super::{CliError, CliResult, Target};
use shmcache_storage::Permissions;

/// Runs the save command.
pub fn run(
    target: &Target,
    name: &str,
    value: &str,
    password: Option<&str>,
    mode: Option<&str>,
) -> CliResult<()> {
    let value: serde_json::Value = serde_json::from_str(value)?;
    let cache = target.open()?;

    let id = match mode {
        Some(mode) => cache.save_with_permissions(name, &value, password, parse_mode(mode)?)?,
        None => cache.save(name, &value, password)?,
    };

    println!("saved {name:?} in {id}");
    Ok(())
}

/// Parses octal permission bits, with or without a `0o` or `0` prefix.
pub fn parse_mode(mode: &str) -> CliResult<Permissions> {
    let digits = mode.strip_prefix("0o").unwrap_or(mode);
    u32::from_str_radix(digits, 8)
        .ok()
        .and_then(Permissions::from_mode)
        .ok_or_else(|| CliError::InvalidMode(mode.to_string()))
}
