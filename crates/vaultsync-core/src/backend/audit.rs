//! Bundled audit sinks

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::AuditSink;
use crate::Result;
use crate::sync::{CleanupAction, CleanupOutcome, SyncOutcome, SyncSummary, TargetResult};

/// Emits audit records as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAuditSink;

#[async_trait]
impl AuditSink for LogAuditSink {
    async fn record_outcome(&self, result: &TargetResult) -> Result<()> {
        match result.outcome {
            SyncOutcome::Failed => tracing::warn!(
                "{}/{}: failed: {}",
                result.namespace,
                result.name,
                result.error.as_deref().unwrap_or("unknown error")
            ),
            outcome => tracing::info!("{}/{}: {}", result.namespace, result.name, outcome),
        }
        Ok(())
    }

    async fn record_cleanup(&self, outcome: &CleanupOutcome) -> Result<()> {
        match outcome.action {
            CleanupAction::Failed => tracing::warn!(
                "cleanup {}/{}: failed: {}",
                outcome.namespace,
                outcome.name,
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
            action => tracing::info!("cleanup {}/{}: {}", outcome.namespace, outcome.name, action),
        }
        Ok(())
    }

    async fn record_summary(&self, summary: &SyncSummary) -> Result<()> {
        tracing::info!(
            "Cycle {} finished in {}ms: {}",
            summary.cycle_id,
            summary.elapsed_ms,
            summary.one_line()
        );
        Ok(())
    }

    async fn record_failure(&self, cycle_id: &str, message: &str) -> Result<()> {
        tracing::error!("Cycle {} aborted: {}", cycle_id, message);
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum AuditRecord<'a> {
    Outcome {
        at: DateTime<Utc>,
        #[serde(flatten)]
        result: &'a TargetResult,
    },
    Cleanup {
        at: DateTime<Utc>,
        #[serde(flatten)]
        outcome: &'a CleanupOutcome,
    },
    Summary {
        at: DateTime<Utc>,
        cycle_id: &'a str,
        elapsed_ms: u64,
        dry_run: bool,
        cancelled: bool,
        created: usize,
        updated: usize,
        skipped: usize,
        failed: usize,
        deleted: usize,
        keys_removed: usize,
        warnings: usize,
    },
    Failure {
        at: DateTime<Utc>,
        cycle_id: &'a str,
        message: &'a str,
    },
}

/// Appends one JSON object per record to a file
#[derive(Debug)]
pub struct JsonLinesAuditSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, record: &AuditRecord<'_>) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for JsonLinesAuditSink {
    async fn record_outcome(&self, result: &TargetResult) -> Result<()> {
        self.append(&AuditRecord::Outcome {
            at: Utc::now(),
            result,
        })
        .await
    }

    async fn record_cleanup(&self, outcome: &CleanupOutcome) -> Result<()> {
        self.append(&AuditRecord::Cleanup {
            at: Utc::now(),
            outcome,
        })
        .await
    }

    async fn record_summary(&self, summary: &SyncSummary) -> Result<()> {
        self.append(&AuditRecord::Summary {
            at: Utc::now(),
            cycle_id: &summary.cycle_id,
            elapsed_ms: summary.elapsed_ms,
            dry_run: summary.dry_run,
            cancelled: summary.cancelled,
            created: summary.created,
            updated: summary.updated,
            skipped: summary.skipped,
            failed: summary.failed,
            deleted: summary.cleanup.deleted,
            keys_removed: summary.cleanup.keys_removed,
            warnings: summary.warnings.len(),
        })
        .await
    }

    async fn record_failure(&self, cycle_id: &str, message: &str) -> Result<()> {
        self.append(&AuditRecord::Failure {
            at: Utc::now(),
            cycle_id,
            message,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vaultsync_model::TargetKey;

    #[tokio::test]
    async fn json_lines_sink_appends_one_object_per_record() {
        let temp = TempDir::new().unwrap();
        let sink = JsonLinesAuditSink::new(temp.path().join("audit/log.jsonl"));

        let key = TargetKey::new("ns", "db");
        sink.record_outcome(&TargetResult::new(&key, SyncOutcome::Created, vec!["1".into()], false))
            .await
            .unwrap();
        sink.record_failure("cycle-1", "authentication failed")
            .await
            .unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "outcome");
        assert_eq!(lines[0]["outcome"], "created");
        assert_eq!(lines[0]["namespace"], "ns");
        assert_eq!(lines[1]["kind"], "failure");
        assert_eq!(lines[1]["cycle_id"], "cycle-1");
    }
}
