//! # Pipeline Tests
//!
//! End-to-end tests that drive the compiled binary against a temporary
//! workspace: init, ingest, re-ingest (idempotence), export, import,
//! insights, and verify.

use std::path::Path;
use std::process::{Command, Output};

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_signalgraph"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("run signalgraph")
}

fn run_ok(dir: &Path, args: &[&str]) -> Output {
    let output = run(dir, args);
    assert!(
        output.status.success(),
        "command {:?} failed:\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn setup_docs(dir: &Path) {
    let docs = dir.join("docs");
    std::fs::create_dir(&docs).expect("create docs");
    std::fs::write(
        docs.join("a.txt"),
        "Acme Labs was founded by Ada Lovelace. Acme Labs uses rust.",
    )
    .expect("write a.txt");
    std::fs::write(docs.join("b.txt"), "Grace Hopper works at Acme Labs.").expect("write b.txt");
}

#[test]
fn ingest_is_idempotent_end_to_end() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = tmp.path();
    setup_docs(dir);

    run_ok(dir, &["-D", "graph.db", "init"]);
    run_ok(dir, &["-D", "graph.db", "ingest", "--data-dir", "docs"]);
    run_ok(
        dir,
        &["-D", "graph.db", "export", "--output", "first.json"],
    );

    // Second run over unchanged inputs must change nothing.
    run_ok(dir, &["-D", "graph.db", "ingest", "--data-dir", "docs"]);
    run_ok(
        dir,
        &["-D", "graph.db", "export", "--output", "second.json"],
    );

    let first = std::fs::read(dir.join("first.json")).expect("read first");
    let second = std::fs::read(dir.join("second.json")).expect("read second");
    assert_eq!(first, second, "re-ingest must re-export byte-identically");

    run_ok(dir, &["-D", "graph.db", "verify"]);
}

#[test]
fn status_reports_merged_content() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = tmp.path();
    setup_docs(dir);

    run_ok(dir, &["-D", "graph.db", "init"]);
    run_ok(dir, &["-D", "graph.db", "ingest", "--data-dir", "docs"]);

    let output = run_ok(dir, &["-D", "graph.db", "--json-mode", "status"]);
    let status: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse status JSON");

    assert_eq!(status["source_files"], 2);
    assert!(status["node_count"].as_u64().expect("node_count") >= 4);
    assert!(status["edge_count"].as_u64().expect("edge_count") >= 3);
    assert!(status["last_updated"].is_u64());
}

#[test]
fn import_roundtrip_preserves_export_bytes() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = tmp.path();
    setup_docs(dir);

    run_ok(dir, &["-D", "graph.db", "init"]);
    run_ok(dir, &["-D", "graph.db", "ingest", "--data-dir", "docs"]);
    run_ok(dir, &["-D", "graph.db", "export", "--output", "graph.json"]);

    // Import into a fresh database and compare exports.
    run_ok(
        dir,
        &["-D", "other.db", "import", "--input", "graph.json"],
    );
    run_ok(dir, &["-D", "other.db", "verify"]);
    run_ok(
        dir,
        &["-D", "other.db", "export", "--output", "roundtrip.json"],
    );

    let original = std::fs::read(dir.join("graph.json")).expect("read original");
    let roundtrip = std::fs::read(dir.join("roundtrip.json")).expect("read roundtrip");
    assert_eq!(original, roundtrip);
}

#[test]
fn batch_ingest_and_partial_failure_exit_code() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = tmp.path();

    run_ok(dir, &["-D", "graph.db", "init"]);

    let good = serde_json::json!([{
        "file": "external/report.txt",
        "checksum": "sum-report",
        "entities": [{
            "text": "Globex",
            "kind": "ORG",
            "span": {"start": 0, "end": 6},
            "rule": "capitalized-noun",
            "confidence": 100
        }],
        "relations": []
    }]);
    std::fs::write(
        dir.join("good.json"),
        serde_json::to_vec(&good).expect("serialize"),
    )
    .expect("write good.json");

    run_ok(dir, &["-D", "graph.db", "ingest", "--batch", "good.json"]);

    // One batch with an invalid candidate: the run finishes but exits 2.
    let bad = serde_json::json!([{
        "file": "external/broken.txt",
        "checksum": "sum-broken",
        "entities": [{
            "text": "",
            "kind": "ORG",
            "span": {"start": 0, "end": 1},
            "rule": "capitalized-noun",
            "confidence": 100
        }],
        "relations": []
    }]);
    std::fs::write(
        dir.join("bad.json"),
        serde_json::to_vec(&bad).expect("serialize"),
    )
    .expect("write bad.json");

    let output = run(dir, &["-D", "graph.db", "ingest", "--batch", "bad.json"]);
    assert_eq!(output.status.code(), Some(2));

    // The failed file left no trace; the good one is still there.
    let status_output = run_ok(dir, &["-D", "graph.db", "--json-mode", "status"]);
    let status: serde_json::Value =
        serde_json::from_slice(&status_output.stdout).expect("parse status JSON");
    assert_eq!(status["source_files"], 1);
    assert_eq!(status["node_count"], 1);
}

#[test]
fn insights_json_output_is_deterministic() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = tmp.path();
    setup_docs(dir);

    run_ok(dir, &["-D", "graph.db", "init"]);
    run_ok(dir, &["-D", "graph.db", "ingest", "--data-dir", "docs"]);

    let first = run_ok(
        dir,
        &["-D", "graph.db", "--json-mode", "insights", "--min-support", "1"],
    );
    let second = run_ok(
        dir,
        &["-D", "graph.db", "--json-mode", "insights", "--min-support", "1"],
    );
    assert_eq!(first.stdout, second.stdout);

    let report: serde_json::Value =
        serde_json::from_slice(&first.stdout).expect("parse insights JSON");
    assert!(report["summary"]["node_count"].as_u64().expect("nodes") >= 4);
    assert!(report["motifs"].as_array().expect("motifs").len() >= 2);
}

#[test]
fn init_refuses_to_clobber_without_force() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = tmp.path();

    run_ok(dir, &["-D", "graph.db", "init"]);

    let output = run(dir, &["-D", "graph.db", "init"]);
    assert_eq!(output.status.code(), Some(1));

    run_ok(dir, &["-D", "graph.db", "init", "--force"]);
}
