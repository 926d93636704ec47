//! Inspect command implementation.

use super::{CliResult, Target};
use serde::Serialize;
use shmcache_core::CacheInventory;

/// Inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Segment directory.
    pub path: String,
    /// Directory table summary.
    #[serde(flatten)]
    pub inventory: CacheInventory,
}

/// Runs the inspect command.
pub fn run(target: &Target, format: &str) -> CliResult<()> {
    let cache = target.open()?;
    let result = InspectResult {
        path: target.path().display().to_string(),
        inventory: cache.inventory()?,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    let inv = &result.inventory;
    println!("shmcache inspection");
    println!("===================");
    println!();
    println!("Path: {}", result.path);
    if !inv.initialized {
        println!();
        println!("No root table: the cache is empty.");
        println!("Segments present: {}", inv.segments);
        return;
    }
    println!();
    println!("Root table:");
    println!("  Names:      {}", inv.root_names);
    println!("  Namespaces: {}", inv.namespaces.len());
    println!("  Segments:   {}", inv.segments);

    if !inv.namespaces.is_empty() {
        println!();
        println!("Namespaces:");
        for ns in &inv.namespaces {
            println!(
                "  [seg:{}] {} names{} {}",
                ns.table,
                ns.names,
                if ns.verified { "" } else { " (unverified)" },
                ns.token
            );
        }
    }
}
