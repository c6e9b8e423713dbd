//! Sync command implementation
//!
//! Builds an orchestrator from the resolved configuration and runs one cycle.

use std::sync::Arc;

use colored::Colorize;
use tokio_util::sync::CancellationToken;

use vaultsync_core::config::AuditKind;
use vaultsync_core::{
    AuditSink, CleanupAction, ConfigResolver, FileStateStore, JsonLinesAuditSink, LogAuditSink,
    Orchestrator, Retrying, SyncConfig, SyncOutcome, SyncSummary,
};
use vaultsync_fs::ProcessLock;

use super::{ExitStatus, directory_sink, export_source};
use crate::error::{CliError, Result};

/// Flags of `vaultsync sync`
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncArgs {
    pub dry_run: bool,
    pub no_cleanup: bool,
    pub json: bool,
}

/// Run the sync command
pub async fn run_sync(resolver: &ConfigResolver, args: SyncArgs) -> Result<ExitStatus> {
    let mut config = resolver.resolve()?;
    if args.dry_run {
        config.sync.dry_run = true;
    }
    if args.no_cleanup {
        config.cleanup.enabled = false;
    }

    let orchestrator = build_orchestrator(&config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; finishing in-flight targets");
            on_interrupt.cancel();
        }
    });

    if !args.json {
        println!(
            "{} Synchronizing vault items{}...",
            "=>".blue().bold(),
            if config.sync.dry_run { " (dry-run)" } else { "" }
        );
    }

    let summary = orchestrator.sync_once(&cancel).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(if summary.has_failures() {
        ExitStatus::Failures
    } else {
        ExitStatus::Success
    })
}

/// Wire the configured collaborators into an orchestrator
pub fn build_orchestrator(config: &SyncConfig) -> Result<Orchestrator> {
    let source = Retrying::new(export_source(config)?, config.retry.clone());
    let sink = Retrying::new(directory_sink(config)?, config.retry.clone());

    let audit: Arc<dyn AuditSink> = match config.audit.kind {
        AuditKind::Log => Arc::new(LogAuditSink),
        AuditKind::JsonLines => {
            let path = config
                .audit
                .path
                .as_ref()
                .ok_or_else(|| CliError::user("audit.path is required for json-lines audit"))?;
            Arc::new(JsonLinesAuditSink::new(path))
        }
    };

    let mut orchestrator = Orchestrator::new(Arc::new(source), Arc::new(sink))
        .with_audit(audit)
        .with_state_store(Arc::new(FileStateStore::new(config.state_path())))
        .with_options(config.sync_options())
        .with_cleanup(config.cleanup_options());
    if let Some(path) = config.lock_path() {
        orchestrator = orchestrator.with_lock(ProcessLock::new(path));
    }
    Ok(orchestrator)
}

fn print_summary(summary: &SyncSummary) {
    for result in &summary.results {
        let marker = match result.outcome {
            SyncOutcome::Created => "+".green(),
            SyncOutcome::Updated => "~".yellow(),
            SyncOutcome::Skipped => "=".dimmed(),
            SyncOutcome::Failed => "!".red(),
        };
        match &result.error {
            Some(error) => println!(
                "   {} {}/{}: {}",
                marker,
                result.namespace,
                result.name.cyan(),
                error
            ),
            None => println!(
                "   {} {}/{} {}",
                marker,
                result.namespace,
                result.name.cyan(),
                result.outcome.to_string().dimmed()
            ),
        }
    }

    for outcome in &summary.cleanup_results {
        let marker = match outcome.action {
            CleanupAction::Deleted => "-".red(),
            CleanupAction::KeysRemoved => "-".yellow(),
            CleanupAction::Failed => "!".red(),
        };
        println!(
            "   {} {}/{} {}",
            marker,
            outcome.namespace,
            outcome.name.cyan(),
            outcome
                .error
                .as_deref()
                .map(str::to_string)
                .unwrap_or_else(|| outcome.action.to_string())
                .dimmed()
        );
    }

    for warning in &summary.warnings {
        println!("{} {}", "WARN".yellow().bold(), warning);
    }

    println!();
    if summary.cancelled {
        println!(
            "{} Cancelled with {} targets unprocessed: {}",
            "CANCELLED".yellow().bold(),
            summary.unprocessed,
            summary.one_line()
        );
    } else if summary.has_failures() {
        println!("{} {}", "FAILED".red().bold(), summary.one_line());
    } else {
        println!("{} {}", "OK".green().bold(), summary.one_line());
    }
}
