//! vaultsync CLI
//!
//! Runs sync cycles from the command line and inspects what they would do.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use commands::ExitStatus;
use error::Result;
use vaultsync_core::ConfigResolver;

#[tokio::main]
async fn main() {
    let status = match run().await {
        Ok(status) => status,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitStatus::Fatal
        }
    };
    std::process::exit(status.code());
}

async fn run() -> Result<ExitStatus> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let resolver = resolver(&cli);

    match cli.command {
        Some(Commands::Sync {
            dry_run,
            no_cleanup,
            json,
        }) => {
            commands::run_sync(
                &resolver,
                commands::SyncArgs {
                    dry_run,
                    no_cleanup,
                    json,
                },
            )
            .await
        }
        Some(Commands::Render { json }) => commands::run_render(&resolver, json).await,
        Some(Commands::Config) => commands::run_config(&resolver),
        None => {
            // No command provided - show help hint
            println!("{} vault to cluster secret sync", "vaultsync".green().bold());
            println!();
            println!("Run {} for available commands.", "vaultsync --help".cyan());
            Ok(ExitStatus::Success)
        }
    }
}

fn resolver(cli: &Cli) -> ConfigResolver {
    let mut resolver = ConfigResolver::new();
    if let Some(dir) = &cli.config_dir {
        resolver = resolver.with_global_config_dir(dir);
    }
    if let Some(path) = &cli.config {
        resolver = resolver.with_file(path);
    }
    resolver
}

/// Log to stderr so `--json` output stays parseable. `RUST_LOG` wins over
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("{}: tracing subscriber already installed", "warning".yellow());
    }
    tracing::debug!("Verbose mode enabled");
}
