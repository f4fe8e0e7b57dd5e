//! Integration tests for the Grafter CLI.
//!
//! Each test creates fixture data in a temporary directory, invokes the
//! `grafter` binary via `assert_cmd`, and checks outputs and exit codes.
//! Network-backed subcommands are exercised only through their offline
//! paths (`run --output`, `translate`).

#![allow(deprecated)] // cargo_bin deprecation — macro replacement not yet stable

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

/// Convenience: get a `Command` for the `grafter` binary.
fn grafter() -> Command {
    Command::cargo_bin("grafter").expect("grafter binary not found")
}

/// Run a trivial step with `--output`, returning the occurrence file path.
fn run_step_to_file(dir: &Path) -> std::path::PathBuf {
    let occurrence_path = dir.join("clone.occurrence");
    let key_path = dir.join("key.pem");

    grafter()
        .args([
            "run",
            "--name",
            "clone",
            "--key",
            key_path.to_str().unwrap(),
            "--output",
            occurrence_path.to_str().unwrap(),
            "--",
            "sh",
            "-c",
            "echo cloning",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("occurrence written to"));

    occurrence_path
}

// ─── run tests ──────────────────────────────────────────────

#[test]
fn run_writes_signed_occurrence() {
    let dir = tempfile::tempdir().unwrap();
    let occurrence_path = run_step_to_file(dir.path());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&occurrence_path).unwrap()).unwrap();

    assert_eq!(json["kind"], "INTOTO");
    assert_eq!(json["noteName"], "clone");
    assert_eq!(
        json["intoto"]["signed"]["byproducts"]["custom_values"]["return-value"],
        "0"
    );
    assert_eq!(
        json["intoto"]["signed"]["byproducts"]["custom_values"]["stdout"],
        "cloning\n"
    );
    // The link was signed before translation.
    assert_eq!(json["intoto"]["signatures"].as_array().unwrap().len(), 1);
    assert!(json["intoto"]["signatures"][0]["signature"].is_string());
}

#[test]
fn run_records_products() {
    let dir = tempfile::tempdir().unwrap();
    let product = dir.path().join("out.txt");
    let occurrence_path = dir.path().join("step.occurrence");
    let key_path = dir.path().join("key.pem");

    std::fs::write(&product, b"artifact").unwrap();

    grafter()
        .args([
            "run",
            "--name",
            "package",
            "--key",
            key_path.to_str().unwrap(),
            "--products",
            product.to_str().unwrap(),
            "--output",
            occurrence_path.to_str().unwrap(),
            "--",
            "true",
        ])
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&occurrence_path).unwrap()).unwrap();
    let products = json["intoto"]["signed"]["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert!(products[0]["hashes"]["sha256"].is_string());
}

// ─── translate tests ────────────────────────────────────────

#[test]
fn translate_occurrence_back_to_link() {
    let dir = tempfile::tempdir().unwrap();
    let occurrence_path = run_step_to_file(dir.path());
    let link_path = dir.path().join("clone.link");

    grafter()
        .args([
            "translate",
            "--occurrence",
            occurrence_path.to_str().unwrap(),
            "--step-name",
            "clone",
            "--output",
            link_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("link written to"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&link_path).unwrap()).unwrap();
    assert_eq!(json["signed"]["_type"], "link");
    assert_eq!(json["signed"]["name"], "clone");
    // return-value is an integer again on the link side.
    assert_eq!(json["signed"]["byproducts"]["return-value"], 0);
    // Signatures are back in native {keyid, sig} shape.
    assert!(json["signatures"][0]["sig"].is_string());
}

#[test]
fn translate_link_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let occurrence_path = run_step_to_file(dir.path());
    let link_path = dir.path().join("clone.link");
    let occurrence_again = dir.path().join("clone2.occurrence");

    grafter()
        .args([
            "translate",
            "--occurrence",
            occurrence_path.to_str().unwrap(),
            "--step-name",
            "clone",
            "--output",
            link_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    grafter()
        .args([
            "translate",
            "--link",
            link_path.to_str().unwrap(),
            "--resource-uri",
            "clone-resource-uri",
            "--output",
            occurrence_again.to_str().unwrap(),
        ])
        .assert()
        .success();

    let first: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&occurrence_path).unwrap()).unwrap();
    let second: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&occurrence_again).unwrap()).unwrap();
    // The signed payloads match exactly after a full round trip.
    assert_eq!(first["intoto"]["signed"], second["intoto"]["signed"]);
    assert_eq!(first["intoto"]["signatures"], second["intoto"]["signatures"]);
}

#[test]
fn translate_requires_step_name_for_occurrence_input() {
    let dir = tempfile::tempdir().unwrap();
    let occurrence_path = run_step_to_file(dir.path());

    grafter()
        .args([
            "translate",
            "--occurrence",
            occurrence_path.to_str().unwrap(),
            "--output",
            dir.path().join("out.link").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--step-name"));
}

#[test]
fn translate_rejects_missing_input() {
    let dir = tempfile::tempdir().unwrap();

    grafter()
        .args([
            "translate",
            "--output",
            dir.path().join("out.json").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--link or --occurrence"));
}

#[test]
fn translate_rejects_malformed_occurrence() {
    let dir = tempfile::tempdir().unwrap();
    let occurrence_path = dir.path().join("bad.occurrence");

    // Occurrence without the required materials list.
    std::fs::write(
        &occurrence_path,
        serde_json::json!({
            "resource": { "uri": "u" },
            "noteName": "clone",
            "kind": "INTOTO",
            "intoto": { "signatures": [], "signed": { "products": [], "command": [] } }
        })
        .to_string(),
    )
    .unwrap();

    grafter()
        .args([
            "translate",
            "--occurrence",
            occurrence_path.to_str().unwrap(),
            "--step-name",
            "clone",
            "--output",
            dir.path().join("out.link").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("materials"));
}
