//! Layered configuration resolution

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;
use vaultsync_core::config::{AuditKind, ENV_CLEANUP, ENV_CONCURRENCY, ENV_DRY_RUN};
use vaultsync_core::{ConfigResolver, Error, SyncConfig};

const NO_ENV: [(&str, &str); 0] = [];

fn resolver(global: &TempDir) -> ConfigResolver {
    ConfigResolver::new()
        .with_global_config_dir(global.path())
        .with_env(NO_ENV)
}

#[test]
fn nothing_configured_yields_defaults() {
    let global = TempDir::new().unwrap();

    let config = resolver(&global).resolve().unwrap();

    assert_eq!(config, SyncConfig::default());
}

#[test]
fn explicit_file_overrides_global_config() {
    let global = TempDir::new().unwrap();
    fs::write(
        global.path().join("config.toml"),
        "[sync]\nconcurrency = 2\ndry_run = true\n\n[sink]\nsystem_name = \"vault-operator\"\n",
    )
    .unwrap();
    let work = TempDir::new().unwrap();
    let explicit = work.path().join("vaultsync.yaml");
    fs::write(&explicit, "sync:\n  concurrency: 8\ncleanup:\n  protected_secrets: [bootstrap]\n").unwrap();

    let config = resolver(&global).with_file(&explicit).resolve().unwrap();

    assert_eq!(config.sync.concurrency, 8);
    // untouched keys of the same table survive
    assert!(config.sync.dry_run);
    assert_eq!(config.sink.system_name, "vault-operator");
    assert_eq!(config.cleanup.protected_secrets, vec!["bootstrap".to_string()]);
    assert!(config.cleanup.enabled);
}

#[test]
fn json_file_configures_backends() {
    let global = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let explicit = work.path().join("config.json");
    fs::write(
        &explicit,
        r#"{
            "source": {"export_path": "/srv/export.json"},
            "sink": {"root": "/srv/secrets"},
            "audit": {"kind": "json-lines", "path": "/var/log/vaultsync.jsonl"},
            "lock": {"enabled": false}
        }"#,
    )
    .unwrap();

    let config = resolver(&global).with_file(&explicit).resolve().unwrap();

    assert_eq!(config.source.export_path, Some(PathBuf::from("/srv/export.json")));
    assert_eq!(config.sink.root, Some(PathBuf::from("/srv/secrets")));
    assert_eq!(config.audit.kind, AuditKind::JsonLines);
    assert!(config.lock_path().is_none());
}

#[test]
fn environment_wins_over_files() {
    let global = TempDir::new().unwrap();
    fs::write(global.path().join("config.toml"), "[sync]\nconcurrency = 2\n").unwrap();

    let config = ConfigResolver::new()
        .with_global_config_dir(global.path())
        .with_env([(ENV_DRY_RUN, "yes"), (ENV_CLEANUP, "off"), (ENV_CONCURRENCY, " 6 ")])
        .resolve()
        .unwrap();

    assert!(config.sync.dry_run);
    assert!(config.cleanup_options().is_none());
    assert_eq!(config.sync.concurrency, 6);
}

#[rstest]
#[case(ENV_DRY_RUN, "sometimes")]
#[case(ENV_CLEANUP, "")]
#[case(ENV_CONCURRENCY, "many")]
#[case(ENV_CONCURRENCY, "0")]
#[case(ENV_CONCURRENCY, "-1")]
fn malformed_environment_is_rejected(#[case] name: &str, #[case] value: &str) {
    let global = TempDir::new().unwrap();

    let result = ConfigResolver::new()
        .with_global_config_dir(global.path())
        .with_env([(name, value)])
        .resolve();

    assert!(matches!(result, Err(Error::Config { .. })), "{:?}", result);
}

#[test]
fn invalid_values_in_files_fail_validation() {
    let global = TempDir::new().unwrap();
    fs::write(global.path().join("config.toml"), "[retry]\nmax_attempts = 0\n").unwrap();

    let result = resolver(&global).resolve();

    assert!(matches!(result, Err(Error::Config { .. })));
}

#[test]
fn wrongly_typed_values_are_config_errors() {
    let global = TempDir::new().unwrap();
    fs::write(global.path().join("config.toml"), "[sync]\nconcurrency = \"four\"\n").unwrap();

    let result = resolver(&global).resolve();

    assert!(matches!(result, Err(Error::Config { .. })));
}

#[test]
fn missing_explicit_file_is_an_error() {
    let global = TempDir::new().unwrap();

    let result = resolver(&global).with_file(global.path().join("absent.toml")).resolve();

    assert!(result.is_err());
}

#[test]
fn unparsable_global_config_is_an_error() {
    let global = TempDir::new().unwrap();
    fs::write(global.path().join("config.toml"), "[sync\n").unwrap();

    assert!(resolver(&global).resolve().is_err());
}
