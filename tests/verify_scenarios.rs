//! Verification Scenarios
//!
//! End-to-end checks of documents on disk against a schema loaded from disk.

use std::path::PathBuf;

use treeform::loader::load_schema_file;
use treeform::{analyze_schema, DiagnosticCode, TextTreeLoader, Verifier};

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

// =============================================================================
// File Verification Tests
// =============================================================================

#[test]
fn test_album_file_passes() {
    let schema = load_schema_file(&fixtures_path().join("album.tfs")).unwrap();
    let verifier = Verifier::new(&schema);

    let report = verifier
        .verify_file(&fixtures_path().join("summer.alb"), &TextTreeLoader)
        .unwrap();

    assert!(report.passed, "diagnostics:\n{}", report.diagnostics);
    assert!(!report.diagnostics.has_warnings());

    // both photo lines should have been classified
    let photos = report
        .diagnostics
        .all()
        .iter()
        .filter(|i| i.code == DiagnosticCode::CandidateSelected && i.subject == "photo")
        .count();
    assert_eq!(photos, 2);
}

#[test]
fn test_unknown_node_fails() {
    let schema = load_schema_file(&fixtures_path().join("album.tfs")).unwrap();
    let verifier = Verifier::new(&schema);

    let report = verifier
        .verify_file(&fixtures_path().join("broken.alb"), &TextTreeLoader)
        .unwrap();

    assert!(!report.passed);
    assert!(report
        .diagnostics
        .all()
        .iter()
        .any(|i| i.code == DiagnosticCode::NodeUnidentified && i.subject == "location"));
    // an unexpected node is a conformance failure, not an internal error
    assert!(!report.diagnostics.has_errors());
}

#[test]
fn test_extension_mismatch_fails_the_check() {
    let schema = load_schema_file(&fixtures_path().join("album.tfs")).unwrap();
    let verifier = Verifier::new(&schema);

    let report = verifier
        .verify_file(&fixtures_path().join("holiday.txt"), &TextTreeLoader)
        .unwrap();

    assert!(!report.passed);
    assert!(report
        .diagnostics
        .all()
        .iter()
        .any(|i| i.code == DiagnosticCode::ExtensionMismatch));
    // the tree itself conforms, so the extension is the only warning
    assert_eq!(report.diagnostics.warning_count(), 1);
}

// =============================================================================
// Schema Analysis and Report Shape
// =============================================================================

#[test]
fn test_fixture_schema_is_clean() {
    let schema = load_schema_file(&fixtures_path().join("album.tfs")).unwrap();
    let findings = analyze_schema(&schema);
    assert!(findings.is_empty(), "findings:\n{}", findings);
}

#[test]
fn test_report_serializes_to_json() {
    let schema = load_schema_file(&fixtures_path().join("album.tfs")).unwrap();
    let report = Verifier::new(&schema)
        .verify_file(&fixtures_path().join("summer.alb"), &TextTreeLoader)
        .unwrap();

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["passed"], serde_json::json!(true));
    assert!(value["diagnostics"]["items"].is_array());
}
