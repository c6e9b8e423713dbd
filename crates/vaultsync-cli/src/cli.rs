//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// vaultsync - Sync password vault items into cluster secrets
#[derive(Parser, Debug)]
#[command(name = "vaultsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, JSON, or YAML)
    #[arg(short, long, global = true, env = "VAULTSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the global config.toml
    #[arg(long, global = true, env = "VAULTSYNC_CONFIG_DIR", hide = true)]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run one sync cycle
    ///
    /// Exits with 1 when the cycle aborts and 2 when it completes with
    /// failed targets.
    ///
    /// Examples:
    ///   vaultsync sync                 # Sync and clean up orphans
    ///   vaultsync sync --dry-run       # Report what would change
    ///   vaultsync sync --json          # Machine-readable summary
    Sync {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Skip orphan cleanup for this cycle
        #[arg(long)]
        no_cleanup: bool,

        /// Output the cycle summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the secrets the vault export would produce, values masked
    Render {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved configuration
    Config,
}
