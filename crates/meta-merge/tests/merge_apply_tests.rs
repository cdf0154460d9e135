//! Merge-driver scenarios against real files in temp branches.

use std::fs;
use std::path::Path;

use meta_config::Config;
use meta_diff::{DiffRow, MergeAction, RowMeta};
use meta_merge::{MergeLog, MergeOptions, Merger};

const TARGET_OBJECT: &str = "<CustomObject xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n\
    <fields>\n\
        <fullName>Alpha__c</fullName>\n\
        <type>Text</type>\n\
    </fields>\n\
    <indexes/>\n\
    <sharingModel>ReadWrite</sharingModel>\n\
</CustomObject>\n";

fn setup(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let source = dir.join("src");
    let target = dir.join("trg");
    fs::create_dir_all(source.join("objects")).unwrap();
    fs::create_dir_all(target.join("objects")).unwrap();
    fs::write(target.join("objects/Account.object"), TARGET_OBJECT).unwrap();
    (source, target)
}

fn row(action: MergeAction, path: &str, keys: &[&str], new_value: &str) -> DiffRow {
    let meta = RowMeta {
        timestamp: "2026-08-02 10:00:00".to_string(),
        ..RowMeta::default()
    };
    let mut row = DiffRow::new(&meta, action, "CustomObject=Account".to_string(), path.to_string());
    for (slot, key) in row.keys.iter_mut().zip(keys.iter()) {
        *slot = (*key).to_string();
    }
    row.new_value = new_value.to_string();
    row
}

#[test]
fn update_file_copies_from_source() {
    let dir = tempfile::tempdir().unwrap();
    let (source, target) = setup(dir.path());
    fs::write(source.join("objects/Account.object"), "fresh copy\n").unwrap();

    let config = Config::builtin();
    let log = MergeLog::group(vec![row(
        MergeAction::UpdateFile,
        "objects/Account.object",
        &["#OVERWRITE#"],
        "",
    )]);
    let mut merger = Merger::new(&config, &source, &target, MergeOptions::default());
    let report = merger.apply(&log).unwrap();

    assert!(report.success);
    assert_eq!(report.applied(), 1);
    assert_eq!(
        fs::read_to_string(target.join("objects/Account.object")).unwrap(),
        "fresh copy\n"
    );
}

#[test]
fn second_row_after_file_update_is_skipped_with_note() {
    let dir = tempfile::tempdir().unwrap();
    let (source, target) = setup(dir.path());
    fs::write(source.join("objects/Account.object"), "fresh copy\n").unwrap();

    let config = Config::builtin();
    let log = MergeLog::group(vec![
        row(MergeAction::UpdateFile, "objects/Account.object", &["#OVERWRITE#"], ""),
        row(MergeAction::UpdateFile, "objects/Account.object", &["#OVERWRITE#"], ""),
    ]);
    let mut merger = Merger::new(&config, &source, &target, MergeOptions::default());
    let report = merger.apply(&log).unwrap();

    assert_eq!(report.applied(), 1);
    assert_eq!(report.files[0].skipped, 1);
    assert!(report.files[0]
        .notes
        .iter()
        .any(|n| n.contains("already updated")));
}

#[test]
fn delete_file_missing_target_is_a_warning_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (source, target) = setup(dir.path());

    let config = Config::builtin();
    let log = MergeLog::group(vec![row(
        MergeAction::DeleteFile,
        "objects/Ghost.object",
        &[],
        "",
    )]);
    let mut merger = Merger::new(&config, &source, &target, MergeOptions::default());
    let report = merger.apply(&log).unwrap();

    assert!(report.success);
    assert!(report.files[0]
        .notes
        .iter()
        .any(|n| n.contains("already absent")));
}

#[test]
fn create_item_inserts_and_rerun_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let (source, target) = setup(dir.path());
    let config = Config::builtin();

    let create = row(
        MergeAction::CreateItem,
        "objects/Account.object",
        &["fields=Beta__c", "#CONTENTS#"],
        "    <fields>\n        <fullName>Beta__c</fullName>\n        <type>Date</type>\n    </fields>\n",
    );
    let log = MergeLog::group(vec![create.clone()]);

    let mut merger = Merger::new(&config, &source, &target, MergeOptions::default());
    let report = merger.apply(&log).unwrap();
    assert!(report.success);

    let after_first = fs::read_to_string(target.join("objects/Account.object")).unwrap();
    assert!(after_first.contains("Beta__c"));
    let alpha = after_first.find("Alpha__c").unwrap();
    let beta = after_first.find("Beta__c").unwrap();
    assert!(alpha < beta);

    // Re-running the same diff is a no-op with an `already updated` note.
    let mut merger = Merger::new(&config, &source, &target, MergeOptions::default());
    let report = merger.apply(&MergeLog::group(vec![create])).unwrap();
    assert!(report.success);
    let after_second = fs::read_to_string(target.join("objects/Account.object")).unwrap();
    assert_eq!(after_first, after_second);
    assert!(report.files[0]
        .notes
        .iter()
        .any(|n| n.contains("already updated")));
}

#[test]
fn update_item_rewrites_params_section() {
    let dir = tempfile::tempdir().unwrap();
    let (source, target) = setup(dir.path());
    let config = Config::builtin();

    // Trailing newline intentionally missing: the driver repairs it.
    let log = MergeLog::group(vec![row(
        MergeAction::UpdateItem,
        "objects/Account.object",
        &["sharingModel=#PARAM#"],
        "    <sharingModel>Private</sharingModel>",
    )]);
    let mut merger = Merger::new(&config, &source, &target, MergeOptions::default());
    let report = merger.apply(&log).unwrap();
    assert!(report.success);

    let text = fs::read_to_string(target.join("objects/Account.object")).unwrap();
    assert!(text.contains("    <sharingModel>Private</sharingModel>\n"));
    assert!(!text.contains("ReadWrite"));
}

#[test]
fn delete_item_removes_empty_section() {
    let dir = tempfile::tempdir().unwrap();
    let (source, target) = setup(dir.path());
    let config = Config::builtin();

    let log = MergeLog::group(vec![row(
        MergeAction::DeleteItem,
        "objects/Account.object",
        &["indexes=#SINGLE#"],
        "",
    )]);
    let mut merger = Merger::new(&config, &source, &target, MergeOptions::default());
    let report = merger.apply(&log).unwrap();
    assert!(report.success);

    let text = fs::read_to_string(target.join("objects/Account.object")).unwrap();
    assert!(!text.contains("<indexes/>"));
}

#[test]
fn delete_with_nested_update_reports_the_unapplied_action() {
    let dir = tempfile::tempdir().unwrap();
    let (source, target) = setup(dir.path());
    let config = Config::builtin();

    // Both rows bind to the same entry: the delete wins and the nested
    // update must show up in the change log instead of vanishing.
    let log = MergeLog::group(vec![
        row(
            MergeAction::DeleteItem,
            "objects/Account.object",
            &["fields=Alpha__c"],
            "",
        ),
        row(
            MergeAction::UpdateItem,
            "objects/Account.object",
            &["fields=Alpha__c", "#PARAMS#"],
            "        <fullName>Alpha__c</fullName>\n        <type>LongText</type>\n",
        ),
    ]);
    let mut merger = Merger::new(&config, &source, &target, MergeOptions::default());
    let report = merger.apply(&log).unwrap();

    let text = fs::read_to_string(target.join("objects/Account.object")).unwrap();
    assert!(!text.contains("Alpha__c"));
    assert!(report.files[0]
        .notes
        .iter()
        .any(|n| n.contains("unapplied change") && n.contains("fields=Alpha__c")));
}

#[test]
fn missing_target_logs_error_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let (source, target) = setup(dir.path());
    let config = Config::builtin();

    let log = MergeLog::group(vec![
        row(
            MergeAction::UpdateItem,
            "objects/Missing.object",
            &["label=#PARAM#"],
            "<label>X</label>\n",
        ),
        row(
            MergeAction::DeleteItem,
            "objects/Account.object",
            &["indexes=#SINGLE#"],
            "",
        ),
    ]);
    let mut merger = Merger::new(&config, &source, &target, MergeOptions::default());
    let report = merger.apply(&log).unwrap();

    assert!(!report.success);
    assert_eq!(report.error_count(), 1);
    // The healthy file still merged.
    let text = fs::read_to_string(target.join("objects/Account.object")).unwrap();
    assert!(!text.contains("<indexes/>"));
}

#[test]
fn unknown_action_is_a_row_error() {
    let dir = tempfile::tempdir().unwrap();
    let (source, target) = setup(dir.path());
    let config = Config::builtin();

    let log = MergeLog::group(vec![row(
        MergeAction::Unknown("Rename Item".to_string()),
        "objects/Account.object",
        &[],
        "",
    )]);
    let mut merger = Merger::new(&config, &source, &target, MergeOptions::default());
    let report = merger.apply(&log).unwrap();

    assert!(!report.success);
    assert!(report.files[0].errors[0].contains("Rename Item"));
    // Nothing touched.
    assert_eq!(
        fs::read_to_string(target.join("objects/Account.object")).unwrap(),
        TARGET_OBJECT
    );
}

#[test]
fn dry_run_leaves_the_target_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let (source, target) = setup(dir.path());
    let config = Config::builtin();

    let log = MergeLog::group(vec![row(
        MergeAction::DeleteItem,
        "objects/Account.object",
        &["indexes=#SINGLE#"],
        "",
    )]);
    let options = MergeOptions { dry_run: true };
    let mut merger = Merger::new(&config, &source, &target, options);
    let report = merger.apply(&log).unwrap();

    assert!(report.success);
    assert!(report.files[0].notes.iter().any(|n| n.contains("[dry-run]")));
    assert_eq!(
        fs::read_to_string(target.join("objects/Account.object")).unwrap(),
        TARGET_OBJECT
    );
}

#[test]
fn requests_apply_oldest_first() {
    let dir = tempfile::tempdir().unwrap();
    let (source, target) = setup(dir.path());
    let config = Config::builtin();

    let mut newer = row(
        MergeAction::UpdateItem,
        "objects/Account.object",
        &["sharingModel=#PARAM#"],
        "    <sharingModel>Read</sharingModel>\n",
    );
    newer.timestamp = "2026-08-02 12:00:00".to_string();
    let mut older = row(
        MergeAction::UpdateItem,
        "objects/Account.object",
        &["sharingModel=#PARAM#"],
        "    <sharingModel>Private</sharingModel>\n",
    );
    older.timestamp = "2026-08-01 12:00:00".to_string();

    let log = MergeLog::group(vec![newer, older]);
    let mut merger = Merger::new(&config, &source, &target, MergeOptions::default());
    merger.apply(&log).unwrap();

    // The newer request wins because it applied last.
    let text = fs::read_to_string(target.join("objects/Account.object")).unwrap();
    assert!(text.contains("<sharingModel>Read</sharingModel>"));
}
