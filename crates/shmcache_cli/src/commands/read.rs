//! Read and list command implementations.

use super::{CliError, CliResult, Target};

/// Runs the read command, printing the value as JSON.
pub fn run(target: &Target, name: &str, password: Option<&str>) -> CliResult<()> {
    let cache = target.open()?;
    let value: serde_json::Value = cache.read(name, password)?.ok_or_else(|| CliError::NotFound {
        name: name.to_string(),
    })?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Runs the list command, printing one name per line.
pub fn list(target: &Target, password: Option<&str>) -> CliResult<()> {
    let cache = target.open()?;
    for name in cache.names(password)? {
        println!("{name}");
    }
    Ok(())
}
