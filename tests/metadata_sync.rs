use pkgconsole::core::config::ConsoleConfig;
use pkgconsole::sync::record::{PackageRecord, record_from_descriptor};
use pkgconsole::sync::{aggregate, local, mirror};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn test_config(root: &Path, operator: &str) -> ConsoleConfig {
    ConsoleConfig {
        operator: operator.to_string(),
        local_root: root.join(operator),
        central_root: root.join("central"),
        ..ConsoleConfig::default()
    }
}

fn record(key: &str, vendor: &str, descriptor_text: &str) -> PackageRecord {
    PackageRecord {
        key: key.to_string(),
        name: "Widget".to_string(),
        version: "1.0".to_string(),
        vendor: vendor.to_string(),
        installer_type: "MSI".to_string(),
        installer_file: "widget.msi".to_string(),
        submitted_by: "tester".to_string(),
        submitted_on: "2026-08-05 10:00:00".to_string(),
        descriptor_text: descriptor_text.to_string(),
    }
}

#[test]
fn upsert_is_idempotent_per_key() {
    let tmp = tempdir().expect("tempdir");
    let config = test_config(tmp.path(), "alice");

    local::initialize_local_db(&config).expect("init");
    local::upsert_local(&config, &record("K1", "Acme", "[PRODUCT INFO]\nAPPKEYID=K1\n"))
        .expect("first upsert");
    local::upsert_local(&config, &record("K1", "Acme", "[PRODUCT INFO]\nAPPKEYID=K1\nAPPVER=2\n"))
        .expect("second upsert");

    let rows = local::list_local(&config).expect("list");
    assert_eq!(rows.len(), 1);
    assert!(rows[0].descriptor_text.contains("APPVER=2"));
}

#[test]
fn upsert_keeps_distinct_keys() {
    let tmp = tempdir().expect("tempdir");
    let config = test_config(tmp.path(), "alice");

    local::upsert_local(&config, &record("K1", "Acme", "a")).expect("upsert K1");
    local::upsert_local(&config, &record("K2", "Acme", "b")).expect("upsert K2");

    let rows = local::list_local(&config).expect("list");
    assert_eq!(rows.len(), 2);
}

#[test]
fn list_on_absent_store_is_empty() {
    let tmp = tempdir().expect("tempdir");
    let config = test_config(tmp.path(), "alice");
    assert!(local::list_local(&config).expect("list").is_empty());
}

#[test]
fn broker_audits_every_store_mutation() {
    let tmp = tempdir().expect("tempdir");
    let config = test_config(tmp.path(), "alice");

    local::upsert_local(&config, &record("K1", "Acme", "a")).expect("upsert");

    let audit = config.metadata_dir().join("broker.events.jsonl");
    let content = fs::read_to_string(&audit).expect("audit log");
    let event: serde_json::Value =
        serde_json::from_str(content.lines().next().expect("one event")).expect("valid json");
    assert_eq!(event["operator"], "alice");
    assert_eq!(event["op"], "packages.upsert");
    assert_eq!(event["status"], "success");
}

#[test]
fn mirror_copies_local_store_to_operator_file() {
    let tmp = tempdir().expect("tempdir");
    let config = test_config(tmp.path(), "alice");

    local::upsert_local(&config, &record("K1", "Acme", "text")).expect("upsert");
    let outcome = mirror::mirror_to_central(&config);
    assert!(outcome.ok, "mirror failed: {:?}", outcome.detail);

    let central = config.central_db_path();
    assert!(central.ends_with("metadata/alice_packages.db"));
    let rows = aggregate::read_central_file(&central).expect("read central");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key, "K1");
}

#[test]
fn mirror_without_local_store_reports_failure() {
    let tmp = tempdir().expect("tempdir");
    let config = test_config(tmp.path(), "alice");

    let outcome = mirror::mirror_to_central(&config);
    assert!(!outcome.ok);
    let detail = outcome.detail.expect("detail");
    assert!(detail.contains("packages.db"), "detail: {detail}");
}

#[test]
fn mirror_failure_reports_detail_and_keeps_local_intact() {
    let tmp = tempdir().expect("tempdir");
    let config = test_config(tmp.path(), "alice");
    local::upsert_local(&config, &record("K1", "Acme", "text")).expect("upsert");

    // Occupy the central file path with a directory so the direct copy and
    // the snapshot fallback both fail.
    fs::create_dir_all(config.central_db_path()).expect("block path");

    let outcome = mirror::mirror_to_central(&config);
    assert!(!outcome.ok);
    assert!(outcome.detail.expect("detail").contains("alice_packages.db"));

    // The authoritative local store is untouched.
    assert_eq!(local::list_local(&config).expect("list").len(), 1);
}

#[test]
fn mirror_overwrites_previous_central_copy() {
    let tmp = tempdir().expect("tempdir");
    let config = test_config(tmp.path(), "alice");

    local::upsert_local(&config, &record("K1", "Acme", "v1")).expect("upsert");
    assert!(mirror::mirror_to_central(&config).ok);
    local::upsert_local(&config, &record("K1", "Acme", "v2")).expect("upsert");
    assert!(mirror::mirror_to_central(&config).ok);

    let rows = aggregate::read_central_file(&config.central_db_path()).expect("read");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].descriptor_text, "v2");
}

#[test]
fn submission_record_flows_from_descriptor_to_store() {
    let tmp = tempdir().expect("tempdir");
    let config = test_config(tmp.path(), "alice");

    let text = "[PRODUCT INFO]\nAPPVENDOR=Acme\nAPPNAME=Widget\nAPPVER=1.0\nAPPKEYID=ACME_WIDGET_1.0\n\n[INSTALL1]\nTYPE=MSI\nMSI=widget.msi\n";
    let record =
        record_from_descriptor(text, &config.operator, "2026-08-05 10:00:00").expect("record");
    local::upsert_local(&config, &record).expect("upsert");

    let rows = local::list_local(&config).expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key, "ACME_WIDGET_1.0");
    assert_eq!(rows[0].installer_file, "widget.msi");
    assert_eq!(rows[0].submitted_by, "alice");
    assert_eq!(rows[0].descriptor_text, text);
}
