//! Audit sinks for asserting on what a cycle reported

use std::sync::Mutex;

use async_trait::async_trait;
use vaultsync_core::{AuditSink, CleanupOutcome, Error, Result, SyncSummary, TargetResult};

/// Keeps every record in memory
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    pub outcomes: Mutex<Vec<TargetResult>>,
    pub cleanups: Mutex<Vec<CleanupOutcome>>,
    pub summaries: Mutex<Vec<SyncSummary>>,
    pub failures: Mutex<Vec<String>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> Vec<TargetResult> {
        self.outcomes.lock().unwrap().clone()
    }

    pub fn cleanups(&self) -> Vec<CleanupOutcome> {
        self.cleanups.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<SyncSummary> {
        self.summaries.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record_outcome(&self, result: &TargetResult) -> Result<()> {
        self.outcomes.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn record_cleanup(&self, outcome: &CleanupOutcome) -> Result<()> {
        self.cleanups.lock().unwrap().push(outcome.clone());
        Ok(())
    }

    async fn record_summary(&self, summary: &SyncSummary) -> Result<()> {
        self.summaries.lock().unwrap().push(summary.clone());
        Ok(())
    }

    async fn record_failure(&self, _cycle_id: &str, message: &str) -> Result<()> {
        self.failures.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Fails every call
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn record_outcome(&self, _result: &TargetResult) -> Result<()> {
        Err(Error::backend("audit store unavailable"))
    }

    async fn record_cleanup(&self, _outcome: &CleanupOutcome) -> Result<()> {
        Err(Error::backend("audit store unavailable"))
    }

    async fn record_summary(&self, _summary: &SyncSummary) -> Result<()> {
        Err(Error::backend("audit store unavailable"))
    }

    async fn record_failure(&self, _cycle_id: &str, _message: &str) -> Result<()> {
        Err(Error::backend("audit store unavailable"))
    }
}
