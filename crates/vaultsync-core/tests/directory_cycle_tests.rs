//! Cycles against the bundled export source and directory sink

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use vaultsync_core::{
    DirectorySink, ExportSource, FileStateStore, Orchestrator, SecretSink, SyncOutcome,
};
use vaultsync_model::names::MANAGED_KEYS_ANNOTATION;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/exports/basic.json")
}

struct Workspace {
    dir: TempDir,
    sink: Arc<DirectorySink>,
}

impl Workspace {
    fn new(namespaces: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        fs::copy(fixture(), dir.path().join("export.json")).unwrap();
        let sink = Arc::new(DirectorySink::new(dir.path().join("secrets")));
        for ns in namespaces {
            sink.create_namespace(ns).unwrap();
        }
        Self { dir, sink }
    }

    fn export_path(&self) -> PathBuf {
        self.dir.path().join("export.json")
    }

    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(Arc::new(ExportSource::new(self.export_path())), self.sink.clone())
            .with_state_store(Arc::new(FileStateStore::new(self.dir.path().join("state.json"))))
    }
}

#[tokio::test]
async fn missing_namespaces_fail_only_their_targets() {
    let ws = Workspace::new(&["default", "payments"]);

    let summary = ws.orchestrator().sync_once(&CancellationToken::new()).await.unwrap();

    assert_eq!(summary.items_fetched, 3);
    assert_eq!(summary.targets_total, 3);
    assert_eq!((summary.created, summary.failed), (2, 1));
    let failed: Vec<_> = summary
        .results
        .iter()
        .filter(|r| r.outcome == SyncOutcome::Failed)
        .map(|r| r.namespace.as_str())
        .collect();
    assert_eq!(failed, vec!["staging"]);

    let payments = ws.sink.get_secret("payments", "payments-api").await.unwrap().unwrap();
    assert_eq!(payments.data["API_TOKEN"], "s3cret");
    assert_eq!(payments.data["Endpoint"], "https://pay.example.com");
    assert!(ws.dir.path().join("secrets/default/test-item.json").exists());
}

#[tokio::test]
async fn external_keys_survive_updates() {
    let ws = Workspace::new(&["default", "payments", "staging"]);
    let orchestrator = ws.orchestrator();
    let cancel = CancellationToken::new();
    orchestrator.sync_once(&cancel).await.unwrap();

    let mut secret = ws.sink.get_secret("default", "test-item").await.unwrap().unwrap();
    secret.data.insert("added-by-hand".into(), "keep".into());
    ws.sink.update_secret(&secret).await.unwrap();
    let export = fs::read_to_string(ws.export_path()).unwrap().replace("\"p\"", "\"rotated\"");
    fs::write(ws.export_path(), export).unwrap();

    let summary = orchestrator.sync_once(&cancel).await.unwrap();

    assert_eq!((summary.updated, summary.skipped), (1, 2));
    let secret = ws.sink.get_secret("default", "test-item").await.unwrap().unwrap();
    assert_eq!(secret.data["test-item"], "rotated");
    assert_eq!(secret.data["added-by-hand"], "keep");
    assert!(
        !secret
            .annotation(MANAGED_KEYS_ANNOTATION)
            .unwrap_or_default()
            .contains("added-by-hand")
    );
}

#[tokio::test]
async fn removed_items_are_cleaned_up_next_cycle() {
    let ws = Workspace::new(&["default", "payments", "staging"]);
    let orchestrator = ws.orchestrator();
    let cancel = CancellationToken::new();
    orchestrator.sync_once(&cancel).await.unwrap();

    let items = ExportSource::parse(&fs::read_to_string(ws.export_path()).unwrap()).unwrap();
    let kept: Vec<_> = items.into_iter().filter(|i| i.id != "b2").collect();
    fs::write(ws.export_path(), serde_json::to_string(&kept).unwrap()).unwrap();

    let summary = orchestrator.sync_once(&cancel).await.unwrap();

    assert_eq!(summary.cleanup.deleted, 2);
    assert!(ws.sink.get_secret("payments", "payments-api").await.unwrap().is_none());
    assert!(ws.sink.get_secret("staging", "payments-api").await.unwrap().is_none());
    assert!(ws.sink.get_secret("default", "test-item").await.unwrap().is_some());
}
