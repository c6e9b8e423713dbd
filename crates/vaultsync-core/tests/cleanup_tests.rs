//! Orphan cleanup

use std::sync::Arc;

use pretty_assertions::assert_eq;
use vaultsync_core::{CleanupAction, CleanupOptions, OrphanCleanup, SyncPlan, serialize_ledger};
use vaultsync_model::names::{
    CREATED_BY_LABEL, CREATED_BY_VALUE, MANAGED_KEYS_ANNOTATION, SIGNATURE_ANNOTATION,
};
use vaultsync_model::{SecretDocument, SinkSecret};
use vaultsync_test_utils::{MemorySink, RecordingAuditSink, SinkOp, tagged_login};

fn doc(pairs: &[(&str, &str)]) -> SecretDocument {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn managed(namespace: &str, name: &str, data: &[(&str, &str)], ledger: &[&str]) -> SinkSecret {
    SinkSecret::new(namespace, name)
        .with_data(doc(data))
        .with_label(CREATED_BY_LABEL, CREATED_BY_VALUE)
        .with_annotation(MANAGED_KEYS_ANNOTATION, serialize_ledger(ledger))
        .with_annotation(SIGNATURE_ANNOTATION, "sha256:00")
}

fn cleanup(sink: &Arc<MemorySink>, options: CleanupOptions) -> (OrphanCleanup, Arc<RecordingAuditSink>) {
    let audit = Arc::new(RecordingAuditSink::new());
    (OrphanCleanup::new(sink.clone(), audit.clone(), options), audit)
}

#[tokio::test]
async fn orphan_with_external_keys_is_stripped() {
    let sink = Arc::new(MemorySink::new());
    sink.insert(managed("ns", "orphan", &[("x", "1"), ("y", "2")], &["x"]));
    let (cleanup, audit) = cleanup(&sink, CleanupOptions::default());

    let report = cleanup.run(&SyncPlan::default()).await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].action, CleanupAction::KeysRemoved);
    assert_eq!(report.outcomes[0].removed_keys, vec!["x".to_string()]);

    let secret = sink.secret("ns", "orphan").unwrap();
    assert_eq!(secret.data, doc(&[("y", "2")]));
    assert_eq!(secret.annotation(MANAGED_KEYS_ANNOTATION), Some("[]"));
    assert_eq!(secret.annotation(SIGNATURE_ANNOTATION), None);
    assert_eq!(audit.cleanups().len(), 1);
}

#[tokio::test]
async fn fully_managed_orphan_is_deleted() {
    let sink = Arc::new(MemorySink::new());
    sink.insert(managed("ns", "gone", &[("a", "1")], &["a"]));
    let (cleanup, _) = cleanup(&sink, CleanupOptions::default());

    let report = cleanup.run(&SyncPlan::default()).await.unwrap();

    assert_eq!(report.outcomes[0].action, CleanupAction::Deleted);
    assert!(sink.secret("ns", "gone").is_none());
}

#[tokio::test]
async fn targeted_protected_and_foreign_objects_are_left_alone() {
    let sink = Arc::new(MemorySink::new());
    sink.insert(managed("ns", "still-wanted", &[("still-wanted", "p")], &["still-wanted"]));
    sink.insert(managed("ns", "vaultsync-auth-token", &[("token", "t")], &["token"]));
    sink.insert(SinkSecret::new("ns", "helm-owned").with_data(doc(&[("k", "v")])));
    sink.insert(managed("ns", "empty-ledger", &[("k", "v")], &[]));
    let plan = SyncPlan::build(&[tagged_login("1", "still-wanted", "", "p", "ns")]);
    let (cleanup, _) = cleanup(&sink, CleanupOptions::default());

    let report = cleanup.run(&plan).await.unwrap();

    assert!(report.outcomes.is_empty());
    assert_eq!(sink.mutation_count(), 0);
    assert_eq!(sink.secret_count(), 4);
}

#[tokio::test]
async fn dry_run_reports_planned_outcomes_only() {
    let sink = Arc::new(MemorySink::new());
    sink.insert(managed("ns", "strip-me", &[("x", "1"), ("y", "2")], &["x"]));
    sink.insert(managed("ns", "delete-me", &[("x", "1")], &["x"]));
    let options = CleanupOptions {
        dry_run: true,
        ..CleanupOptions::default()
    };
    let (cleanup, _) = cleanup(&sink, options);

    let report = cleanup.run(&SyncPlan::default()).await.unwrap();

    let actions: Vec<_> = report.outcomes.iter().map(|o| (o.name.as_str(), o.action)).collect();
    assert_eq!(
        actions,
        vec![
            ("delete-me", CleanupAction::Deleted),
            ("strip-me", CleanupAction::KeysRemoved)
        ]
    );
    assert!(report.outcomes.iter().all(|o| o.dry_run));
    assert_eq!(sink.mutation_count(), 0);
    assert_eq!(sink.secret_count(), 2);
}

#[tokio::test]
async fn namespace_allow_list_narrows_the_scan() {
    let sink = Arc::new(MemorySink::new());
    sink.insert(managed("scanned", "orphan", &[("x", "1")], &["x"]));
    sink.insert(managed("skipped", "orphan", &[("x", "1")], &["x"]));
    let options = CleanupOptions {
        namespaces: Some(vec!["scanned".to_string()]),
        ..CleanupOptions::default()
    };
    let (cleanup, _) = cleanup(&sink, options);

    cleanup.run(&SyncPlan::default()).await.unwrap();

    assert!(sink.secret("scanned", "orphan").is_none());
    assert!(sink.secret("skipped", "orphan").is_some());
}

#[tokio::test]
async fn one_failing_candidate_does_not_stop_the_rest() {
    let sink = Arc::new(MemorySink::new());
    sink.insert(managed("ns", "a", &[("x", "1")], &["x"]));
    sink.insert(managed("ns", "b", &[("x", "1")], &["x"]));
    sink.fail_backend(SinkOp::Delete, Some("ns"), Some("a"));
    let (cleanup, _) = cleanup(&sink, CleanupOptions::default());

    let report = cleanup.run(&SyncPlan::default()).await.unwrap();

    assert_eq!(report.outcomes[0].action, CleanupAction::Failed);
    assert!(report.outcomes[0].error.is_some());
    assert_eq!(report.outcomes[1].action, CleanupAction::Deleted);
    assert!(sink.secret("ns", "b").is_none());
}

#[tokio::test]
async fn listing_failure_in_one_namespace_is_reported() {
    let sink = Arc::new(MemorySink::new());
    sink.insert(managed("bad", "a", &[("x", "1")], &["x"]));
    sink.insert(managed("good", "a", &[("x", "1")], &["x"]));
    sink.fail_transport(SinkOp::ListManaged, Some("bad"), None);
    let (cleanup, _) = cleanup(&sink, CleanupOptions::default());

    let report = cleanup.run(&SyncPlan::default()).await.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].namespace, "good");
}

#[tokio::test]
async fn object_named_by_a_failing_item_is_kept() {
    let sink = Arc::new(MemorySink::new());
    sink.insert(managed("ns", "database", &[("database", "p")], &["database"]));
    let plan = SyncPlan::build(&[
        tagged_login("1", "Database", "u", "p", "ns").with_text_field("secret-key-password", "@@@"),
    ]);
    let (cleanup, audit) = cleanup(&sink, CleanupOptions::default());

    let report = cleanup.run(&plan).await.unwrap();

    assert!(report.outcomes.is_empty());
    assert!(sink.secret("ns", "database").is_some());
    assert!(audit.cleanups().is_empty());
}
