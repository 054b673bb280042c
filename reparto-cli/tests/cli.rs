//! Integration tests for the reparto binary.
//!
//! Documents are written to temp files in the annotated JSON shape an
//! external tagger would produce.

use assert_cmd::Command;
use predicates::prelude::*;
use reparto::feedback::{InMemoryFeedbackStore, OverrideAction};
use std::fs;
use tempfile::TempDir;

const DOC: &str = r#"{
  "text": "Ayer vino Aldara a casa. Luego vi que Aldara sonreía.",
  "entities": [
    {"text": "Aldara", "label": "PERSON", "start": 10, "end": 16},
    {"text": "Aldara", "label": "PERSON", "start": 38, "end": 44}
  ]
}"#;

fn reparto() -> Command {
    Command::cargo_bin("reparto").unwrap()
}

fn write_doc(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let assert = cmd.assert().success();
    serde_json::from_slice(&assert.get_output().stdout).unwrap()
}

// =============================================================================
// Extract
// =============================================================================

#[test]
fn test_extract_prints_outcome_json() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir, "doc.json", DOC);

    let json = stdout_json(reparto().args(["extract", doc.as_str()]));
    assert_eq!(json["entities"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["entities"][0]["text"], "Aldara");
    assert_eq!(json["entities"][0]["label"], "PER");
    assert_eq!(json["processed_chars"], 53);
    assert!(json.get("error").is_none());
}

#[test]
fn test_extract_entities_only_pretty() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir, "doc.json", DOC);

    reparto()
        .args(["extract", doc.as_str(), "--entities-only", "--pretty"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[\n"))
        .stdout(predicate::str::contains("\"Aldara\""));
}

#[test]
fn test_extract_reads_stdin() {
    let json = stdout_json(reparto().args(["x", "-"]).write_stdin(DOC));
    assert_eq!(json["entities"][0]["text"], "Aldara");
}

#[test]
fn test_extract_without_validation_keeps_every_mention() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir, "doc.json", DOC);

    let json = stdout_json(reparto().args(["extract", doc.as_str(), "--no-validation"]));
    assert_eq!(json["entities"].as_array().map(Vec::len), Some(2));
    assert!(json["validation_method"].is_null());
}

#[test]
fn test_extract_applies_project_feedback() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir, "doc.json", DOC);
    let mut store = InMemoryFeedbackStore::new();
    store
        .add_project_override("saga", "Aldara", OverrideAction::Reject, None, None)
        .unwrap();
    let feedback = write_doc(&dir, "feedback.json", &store.to_json().unwrap());

    let json = stdout_json(reparto().args([
        "extract",
        doc.as_str(),
        "--feedback",
        feedback.as_str(),
        "--project",
        "saga",
    ]));
    assert_eq!(json["entities"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["rejected"][0]["entity"]["text"], "Aldara");

    let json =
        stdout_json(reparto().args(["extract", doc.as_str(), "--feedback", feedback.as_str()]));
    assert_eq!(json["entities"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_extract_with_config_file() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir, "doc.json", DOC);
    let config = write_doc(&dir, "reparto.toml", "[validator]\nthreshold = 0.99\n");

    let json =
        stdout_json(reparto().args(["extract", doc.as_str(), "--config", config.as_str()]));
    assert_eq!(json["entities"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["rejected"].as_array().map(Vec::len), Some(2));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_extract_missing_file_fails() {
    reparto()
        .args(["extract", "/nonexistent/doc.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_extract_malformed_json_fails() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir, "doc.json", "{\"text\": ");

    reparto()
        .args(["extract", doc.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_extract_inconsistent_offsets_fail() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(
        &dir,
        "doc.json",
        r#"{"text": "Aldara", "entities": [{"text": "Aldara", "label": "PER", "start": 0, "end": 40}]}"#,
    );

    reparto().args(["extract", doc.as_str()]).assert().failure();
}

#[test]
fn test_extract_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let doc = write_doc(&dir, "doc.json", DOC);
    let config = write_doc(&dir, "reparto.toml", "[validator]\nthreshold = 2.0\n");

    reparto()
        .args(["extract", doc.as_str(), "--config", config.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("validator.threshold"));
}

// =============================================================================
// Check / Config
// =============================================================================

#[test]
fn test_check_rejects_greeting() {
    reparto()
        .args(["check", "Hola"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("rejected\tHola\t"));
}

#[test]
fn test_check_rejects_preterite_as_person() {
    reparto()
        .args(["check", "Caminó", "--label", "PER"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("rejected"));
}

#[test]
fn test_check_accepts_name() {
    reparto()
        .args(["check", "Aldara", "-l", "PER"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("accepted\tAldara"));
}

#[test]
fn test_check_unknown_label_is_usage_error() {
    reparto()
        .args(["check", "Aldara", "--label", "DATE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown label"));
}

#[test]
fn test_config_prints_defaults() {
    reparto()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("gazetteer_capacity = 5000"))
        .stdout(predicate::str::contains("[validator]"));
}

#[test]
fn test_config_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    let config = write_doc(&dir, "reparto.toml", "gazetteer_capacity = 10\n");

    reparto()
        .args(["config", config.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("gazetteer_capacity = 10"))
        .stdout(predicate::str::contains("tagger_confidence = 0.8"));
}
