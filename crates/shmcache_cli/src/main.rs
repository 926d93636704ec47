//! shmcache CLI
//!
//! Command-line tools for a shmcache segment directory.
//!
//! # Commands
//!
//! - `save` / `read` / `delete` / `list` - work with named values
//! - `destroy` - remove one namespace, or everything
//! - `inspect` - summarise directory tables
//! - `verify` - check every segment against the directory tables

mod commands;

use clap::{Parser, Subcommand};
use shmcache_core::HashAlgorithm;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// shmcache command-line tools.
#[derive(Parser)]
#[command(name = "shmcache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Segment directory (defaults to /dev/shm/shmcache where available)
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Namespace hash function (sha256, crc32)
    #[arg(global = true, long, default_value = "sha256")]
    hash: HashAlgorithm,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a JSON value under a name
    Save {
        /// Name to store under
        name: String,

        /// Value as JSON, e.g. '{"a": 1}' or '"text"'
        value: String,

        /// Namespace password
        #[arg(long)]
        password: Option<String>,

        /// Segment permission bits in octal, e.g. 600
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// Print the value stored under a name
    Read {
        /// Name to read
        name: String,

        /// Namespace password
        #[arg(long)]
        password: Option<String>,
    },

    /// Delete the value stored under a name
    Delete {
        /// Name to delete
        name: String,

        /// Namespace password
        #[arg(long)]
        password: Option<String>,
    },

    /// List the names in one scope
    List {
        /// Namespace password
        #[arg(long)]
        password: Option<String>,
    },

    /// Destroy a namespace, or the whole cache without a password
    Destroy {
        /// Namespace password
        #[arg(long)]
        password: Option<String>,

        /// Also sweep values inside namespace tables
        #[arg(long)]
        deep: bool,
    },

    /// Display directory tables and segment counts
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check every segment against the directory tables
    Verify,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let target = commands::Target::new(cli.path, cli.hash);

    match cli.command {
        Commands::Save {
            name,
            value,
            password,
            mode,
        } => commands::save::run(&target, &name, &value, password.as_deref(), mode.as_deref())?,
        Commands::Read { name, password } => {
            commands::read::run(&target, &name, password.as_deref())?;
        }
        Commands::Delete { name, password } => {
            commands::delete::run(&target, &name, password.as_deref())?;
        }
        Commands::List { password } => commands::read::list(&target, password.as_deref())?,
        Commands::Destroy { password, deep } => {
            commands::destroy::run(&target, password.as_deref(), deep)?;
        }
        Commands::Inspect { format } => commands::inspect::run(&target, &format)?,
        Commands::Verify => commands::verify::run(&target)?,
        Commands::Version => {
            println!("shmcache CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("shmcache core v{}", shmcache_core::VERSION);
        }
    }

    Ok(())
}
