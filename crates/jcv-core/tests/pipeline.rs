//! End-to-end exercises of the conversion, normalization, diff, and report
//! pipeline, the way the CLI drives it.

use std::collections::BTreeSet;
use std::time::Duration;

use jcv_core::diff::ChangeSummary;
use jcv_core::format::{to_value, Format};
use jcv_core::normalize::{format_sorted, remove_keys, sort_keys, to_pretty_string};
use jcv_core::report::{markdown_report, text_summary, ReportInputs};
use jcv_core::{Session, SharedState, Side, Snapshot, SnapshotStore};
use serde_json::json;

#[test]
fn csv_against_yaml_compares_as_json() {
    let left = to_value(b"name,age\nada,36\ngrace,47\n", Format::Csv).unwrap();
    let right = to_value(
        b"- name: ada\n  age: 36\n- name: grace\n  age: 48\n",
        Format::Yaml,
    )
    .unwrap();

    // Arrays are opaque, so the whole list shows as one root modification.
    let summary = ChangeSummary::between(&left, &right);
    assert_eq!(summary.modified.len(), 1);
    assert_eq!(summary.modified[0].path, "");
}

#[test]
fn xml_document_diffs_field_by_field() {
    let before = to_value(
        b"<config><host>db1</host><port>5432</port></config>",
        Format::Xml,
    )
    .unwrap();
    let after = to_value(
        b"<config><host>db2</host><port>5432</port></config>",
        Format::Xml,
    )
    .unwrap();

    let summary = ChangeSummary::between(&before, &after);
    assert_eq!(summary.modified.len(), 1);
    assert_eq!(summary.modified[0].path, "config.host");
    assert_eq!(summary.modified[0].old_value, Some(json!("db1")));
    assert_eq!(summary.modified[0].new_value, Some(json!("db2")));
}

#[test]
fn normalization_pipeline_composes() {
    let noisy = json!({
        "z": {"timestamp": 123, "value": 1},
        "a": {"timestamp": 456, "value": 2}
    });
    let keys: BTreeSet<String> = ["timestamp".to_string()].into();
    let cleaned = sort_keys(remove_keys(noisy, &keys));
    assert_eq!(
        serde_json::to_string(&cleaned).unwrap(),
        r#"{"a":{"value":2},"z":{"value":1}}"#
    );
}

#[test]
fn formatted_documents_with_equal_content_show_no_differences() {
    let left = format_sorted(r#"{"b": 1, "a": {"d": 4, "c": 3}}"#).unwrap();
    let right = format_sorted(r#"{"a": {"c": 3, "d": 4}, "b": 1}"#).unwrap();
    assert_eq!(left, right);

    let summary = ChangeSummary::between(
        &serde_json::from_str(&left).unwrap(),
        &serde_json::from_str(&right).unwrap(),
    );
    assert!(summary.is_empty());
}

#[test]
fn session_report_and_share_flow() {
    let mut session = Session::new(Duration::from_millis(10));
    session.load(Side::Left, "a.json", r#"{"version": 1, "name": "jcv"}"#);
    session.load(Side::Right, "b.json", r#"{"version": 2, "name": "jcv"}"#);

    let summary = session.summary().unwrap();
    let text = text_summary(&summary);
    assert!(text.contains("~ version: 1 -> 2"));

    let inputs = ReportInputs {
        left_label: session.label(Side::Left),
        right_label: session.label(Side::Right),
        original: session.text(Side::Left),
        modified: session.text(Side::Right),
    };
    let markdown = markdown_report(&inputs, &summary);
    assert!(markdown.contains("## Original (a.json)"));

    let state = SharedState {
        original: session.text(Side::Left).to_string(),
        modified: session.text(Side::Right).to_string(),
    };
    let decoded = SharedState::decode(&state.encode()).unwrap();
    assert_eq!(decoded.original, session.text(Side::Left));
}

#[test]
fn autosave_snapshot_survives_a_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = SnapshotStore::at(dir.path()).unwrap();

    let mut session = Session::new(Duration::from_millis(10));
    session.load(Side::Left, "a.json", "{\"x\":1}");
    session.load(Side::Right, "b.json", "{\"x\":2}");
    let snapshot = session.flush_autosave().expect("changes were pending");
    store.save(&snapshot).unwrap();

    let restored: Snapshot = store.load().unwrap().expect("snapshot was persisted");
    let session = Session::from_snapshot(&restored, Duration::from_millis(10));
    assert_eq!(session.text(Side::Left), "{\"x\":1}");
    assert_eq!(session.label(Side::Right), "b.json");
}

#[test]
fn excel_and_csv_conversions_agree_on_shape() {
    let csv = to_value(b"name,age\nada,36\n", Format::Csv).unwrap();
    assert_eq!(csv, json!([{"name": "ada", "age": 36}]));
    // The XLSX mapping produces the same row-object shape; see the format
    // module's unit tests for workbook fixtures.
    let pretty = to_pretty_string(&csv);
    assert!(pretty.contains("    {"));
}
