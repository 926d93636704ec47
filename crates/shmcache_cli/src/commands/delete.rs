//! Delete command implementation.

use super::{CliResult, Target};

/// Runs the delete command. Deleting a missing name is not an error.
pub fn run(target: &Target, name: &str, password: Option<&str>) -> CliResult<()> {
    let cache = target.open()?;
    if cache.delete(name, password)? {
        println!("deleted {name:?}");
    } else {
        println!("{name:?} was not present");
    }
    Ok(())
}
