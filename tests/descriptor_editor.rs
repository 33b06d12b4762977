use pkgconsole::core::error::ConsoleError;
use pkgconsole::descriptor::editor::DescriptorEditor;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const SAMPLE: &str = "[PRODUCT INFO]\nAPPVENDOR=Acme\nAPPNAME=Widget\nAPPVER=1.0\nAPPKEYID=ACME_WIDGET_1.0\n\n[INSTALL1]\nTYPE=MSI\nMSI=widget.msi\n\n[UNINSTALL1]\nTYPE=MSI\n";

fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("Package.ini");
    fs::write(&path, SAMPLE).expect("write sample");
    path
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn open_missing_file_reports_not_found() {
    let tmp = tempdir().expect("tempdir");
    let err = DescriptorEditor::open(&tmp.path().join("nope.ini")).unwrap_err();
    assert!(matches!(err, ConsoleError::NotFound(_)));
    assert!(err.to_string().contains("nope.ini"));
}

#[test]
fn replace_section_is_durable_and_consistent() {
    let tmp = tempdir().expect("tempdir");
    let path = write_sample(tmp.path());
    let mut editor = DescriptorEditor::open(&path).expect("open");

    editor
        .replace_section("VARS", &pairs(&[("LOGDIR", "C:\\Logs"), ("REBOOT", "0")]))
        .expect("replace");

    // In-memory and on-disk views agree before the call returns.
    let on_disk = fs::read_to_string(&path).expect("read back");
    assert_eq!(on_disk, editor.refresh());
    assert!(on_disk.contains("[VARS]\nLOGDIR=C:\\Logs\nREBOOT=0\n"));

    // Created at the end, existing order untouched.
    assert_eq!(
        editor.section_names(),
        vec!["PRODUCT INFO", "INSTALL1", "UNINSTALL1", "VARS"]
    );
}

#[test]
fn replace_all_swaps_the_whole_section_list() {
    let tmp = tempdir().expect("tempdir");
    let path = write_sample(tmp.path());
    let mut editor = DescriptorEditor::open(&path).expect("open");

    editor
        .replace_all(vec![
            ("PRODUCT INFO".to_string(), pairs(&[("APPNAME", "Other")])),
            ("INSTALL1".to_string(), pairs(&[("TYPE", "EXE")])),
        ])
        .expect("replace all");

    assert_eq!(editor.section_names(), vec!["PRODUCT INFO", "INSTALL1"]);
    assert_eq!(
        fs::read_to_string(&path).expect("read"),
        "[PRODUCT INFO]\nAPPNAME=Other\n\n[INSTALL1]\nTYPE=EXE\n"
    );

    // One edit, one undo step back to the full original.
    editor.undo().expect("undo");
    assert_eq!(fs::read_to_string(&path).expect("read"), SAMPLE);
}

#[test]
fn blank_section_name_is_rejected_without_mutation() {
    let tmp = tempdir().expect("tempdir");
    let path = write_sample(tmp.path());
    let mut editor = DescriptorEditor::open(&path).expect("open");

    let err = editor.replace_section("   ", &pairs(&[("A", "1")])).unwrap_err();
    assert!(matches!(err, ConsoleError::FormatError(_)));
    assert_eq!(fs::read_to_string(&path).expect("read"), SAMPLE);
    assert_eq!(editor.undo_depth(), 0);
}

#[test]
fn five_mutations_fully_unwind() {
    let tmp = tempdir().expect("tempdir");
    let path = write_sample(tmp.path());
    let mut editor = DescriptorEditor::open(&path).expect("open");
    let original = editor.refresh();

    for n in 0..5 {
        let value = n.to_string();
        editor
            .replace_section("VARS", &pairs(&[("N", value.as_str())]))
            .expect("mutate");
    }
    for _ in 0..5 {
        editor.undo().expect("undo");
    }

    assert_eq!(editor.refresh(), original);
    assert_eq!(fs::read_to_string(&path).expect("read"), original);
}

#[test]
fn history_cap_drops_the_oldest_snapshot() {
    let tmp = tempdir().expect("tempdir");
    let path = write_sample(tmp.path());
    let mut editor = DescriptorEditor::open(&path).expect("open");

    for n in 0..6 {
        let value = n.to_string();
        editor
            .replace_section("VARS", &pairs(&[("N", value.as_str())]))
            .expect("mutate");
    }
    for _ in 0..5 {
        editor.undo().expect("undo");
    }
    // Depth is bounded at five; the sixth undo has nothing left.
    let err = editor.undo().unwrap_err();
    assert!(matches!(err, ConsoleError::StaleHistory(_)));

    // The deepest restorable state is after the first mutation, not the
    // pristine file.
    let vars = editor.entries("VARS").expect("vars");
    assert_eq!(vars, pairs(&[("N", "0")]));
}

#[test]
fn undo_then_redo_is_identity() {
    let tmp = tempdir().expect("tempdir");
    let path = write_sample(tmp.path());
    let mut editor = DescriptorEditor::open(&path).expect("open");

    editor
        .replace_section("INSTALL1", &pairs(&[("TYPE", "EXE"), ("EXE", "setup.exe")]))
        .expect("mutate");
    let after = editor.refresh();

    editor.undo().expect("undo");
    assert_ne!(editor.refresh(), after);
    editor.redo().expect("redo");
    assert_eq!(editor.refresh(), after);
    assert_eq!(fs::read_to_string(&path).expect("read"), after);
}

#[test]
fn fresh_mutation_invalidates_redo() {
    let tmp = tempdir().expect("tempdir");
    let path = write_sample(tmp.path());
    let mut editor = DescriptorEditor::open(&path).expect("open");

    editor
        .replace_section("VARS", &pairs(&[("A", "1")]))
        .expect("mutate");
    editor.undo().expect("undo");
    assert_eq!(editor.redo_depth(), 1);

    editor
        .replace_section("VARS", &pairs(&[("B", "2")]))
        .expect("mutate");
    let err = editor.redo().unwrap_err();
    assert!(matches!(err, ConsoleError::StaleHistory(_)));
}

#[test]
fn undo_on_empty_history_is_a_reported_no_op() {
    let tmp = tempdir().expect("tempdir");
    let path = write_sample(tmp.path());
    let mut editor = DescriptorEditor::open(&path).expect("open");

    let err = editor.undo().unwrap_err();
    assert!(matches!(err, ConsoleError::StaleHistory(_)));
    assert_eq!(fs::read_to_string(&path).expect("read"), SAMPLE);
}

#[test]
fn copy_section_places_copy_after_source() {
    let tmp = tempdir().expect("tempdir");
    let path = write_sample(tmp.path());
    let mut editor = DescriptorEditor::open(&path).expect("open");

    editor
        .create_section_from("INSTALL1", "INSTALL2")
        .expect("copy");
    assert_eq!(
        editor.section_names(),
        vec!["PRODUCT INFO", "INSTALL1", "INSTALL2", "UNINSTALL1"]
    );
    assert_eq!(
        editor.entries("INSTALL2"),
        editor.entries("INSTALL1")
    );

    let err = editor.create_section_from("INSTALL1", "install2").unwrap_err();
    assert!(matches!(err, ConsoleError::Conflict(_)));
    let err = editor.create_section_from("MISSING", "X1").unwrap_err();
    assert!(matches!(err, ConsoleError::NotFound(_)));
}

#[test]
fn add_section_for_prefix_clones_latest_sibling() {
    let tmp = tempdir().expect("tempdir");
    let path = write_sample(tmp.path());
    let mut editor = DescriptorEditor::open(&path).expect("open");

    let name = editor.add_section_for_prefix("INSTALL").expect("add");
    assert_eq!(name, "INSTALL2");
    assert_eq!(editor.entries("INSTALL2"), editor.entries("INSTALL1"));

    // No sibling for this prefix: an empty section is appended.
    let name = editor.add_section_for_prefix("ARP").expect("add");
    assert_eq!(name, "ARP1");
    assert_eq!(editor.entries("ARP1"), Some(Vec::new()));
}

#[test]
fn remove_operations_report_missing_targets() {
    let tmp = tempdir().expect("tempdir");
    let path = write_sample(tmp.path());
    let mut editor = DescriptorEditor::open(&path).expect("open");

    editor.remove_key("INSTALL1", "MSI").expect("remove key");
    assert_eq!(
        editor.entries("INSTALL1"),
        Some(pairs(&[("TYPE", "MSI")]))
    );

    let err = editor.remove_key("INSTALL1", "MSI").unwrap_err();
    assert!(matches!(err, ConsoleError::NotFound(_)));

    editor.remove_section("UNINSTALL1").expect("remove section");
    let err = editor.remove_section("UNINSTALL1").unwrap_err();
    assert!(matches!(err, ConsoleError::NotFound(_)));
}

#[test]
fn preserving_save_touches_only_known_keys() {
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("Package.ini");
    fs::write(
        &path,
        "; managed by pkgconsole\n[VARS]\nLOGDIR=C:\\Old\n\nfree-form note\n",
    )
    .expect("write");

    let mut editor = DescriptorEditor::open(&path).expect("open");
    editor
        .replace_section("VARS", &pairs(&[("LOGDIR", "D:\\New")]))
        .expect("replace");

    let exported = tmp.path().join("Exported.ini");
    editor.write_preserving_layout(&exported).expect("export");
    let text = fs::read_to_string(&exported).expect("read");
    assert_eq!(
        text,
        "; managed by pkgconsole\n[VARS]\nLOGDIR=D:\\New\n\nfree-form note\n"
    );
}
