//! Batch driver tests on a temporary project directory

use std::fs;
use std::path::PathBuf;

use qsa_core::{parse_script_list, ConvertError, Encoding, FileOutcome, TranspileConfig};
use tempfile::TempDir;

fn script(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn converts_next_to_source() {
    let dir = TempDir::new().unwrap();
    let path = script(&dir, "flmasterfacturas.qs", b"function init() { return 1; }\n");

    let report = parse_script_list(&[&path], &TranspileConfig::default());
    assert!(report.success);
    assert_eq!(report.converted(), 1);

    let python = fs::read_to_string(dir.path().join("flmasterfacturas.py")).unwrap();
    assert!(python.starts_with("# -*- coding: utf-8 -*-\n"));
    assert!(python.ends_with("def init():\n    return 1\n"));
}

#[test]
fn existing_output_is_kept() {
    let dir = TempDir::new().unwrap();
    let path = script(&dir, "a.qs", b"var x = 1;\n");
    let dest = dir.path().join("a.py");
    fs::write(&dest, "# hand edited\n").unwrap();

    let report = parse_script_list(&[&path], &TranspileConfig::default());
    assert!(report.success);
    assert!(matches!(report.files[0].1, FileOutcome::Skipped));
    assert_eq!(fs::read_to_string(&dest).unwrap(), "# hand edited\n");

    // deleting the cached output forces regeneration
    fs::remove_file(&dest).unwrap();
    let report = parse_script_list(&[&path], &TranspileConfig::default());
    assert_eq!(report.converted(), 1);
    assert!(fs::read_to_string(&dest).unwrap().ends_with("x = 1\n"));
}

#[test]
fn output_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let path = script(
        &dir,
        "b.qs",
        b"function f(o) { with (o) { g(); } switch (k) { case 1: h(); } }\n",
    );
    let dest = dir.path().join("b.py");

    parse_script_list(&[&path], &TranspileConfig::default());
    let first = fs::read(&dest).unwrap();
    fs::remove_file(&dest).unwrap();
    parse_script_list(&[&path], &TranspileConfig::default());
    assert_eq!(fs::read(&dest).unwrap(), first);
}

#[test]
fn one_failure_fails_the_batch() {
    let dir = TempDir::new().unwrap();
    let good = script(&dir, "good.qs", b"var x = 1;\n");
    let bad = script(&dir, "bad.qs", b"var = 1;\n");

    let config = TranspileConfig {
        workers: Some(2),
        ..TranspileConfig::default()
    };
    let report = parse_script_list(&[&good, &bad], &config);
    assert!(!report.success);
    assert_eq!(report.converted(), 1);

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, bad.as_path());
    match failures[0].1 {
        ConvertError::Syntax { file, location, .. } => {
            assert_eq!(file, &bad);
            assert_eq!(location.line, 1);
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }

    assert!(dir.path().join("good.py").exists());
    assert!(!dir.path().join("bad.py").exists());
}

#[test]
fn latin1_sources_decode() {
    let dir = TempDir::new().unwrap();
    // "año" in Latin-1
    let path = script(&dir, "c.qs", b"var s = \"a\xf1o\";\n");

    let report = parse_script_list(&[&path], &TranspileConfig::default());
    assert!(!report.success);
    assert!(matches!(
        report.failures().next().unwrap().1,
        ConvertError::Decode { .. }
    ));

    let config = TranspileConfig {
        encoding: Encoding::Latin1,
        ..TranspileConfig::default()
    };
    let report = parse_script_list(&[&path], &config);
    assert!(report.success);
    let python = fs::read_to_string(dir.path().join("c.py")).unwrap();
    assert!(python.contains("s = \"año\"\n"));
}

#[test]
fn ast_dump_is_written_when_enabled() {
    let dir = TempDir::new().unwrap();
    let path = script(&dir, "d.qs", b"function f() {}\n");
    let config = TranspileConfig {
        dump_ast: true,
        ..TranspileConfig::default()
    };

    let report = parse_script_list(&[&path], &config);
    assert!(report.success);
    let xml = fs::read_to_string(dir.path().join("d.xml")).unwrap();
    assert!(xml.contains("<Function name=\"f\""));
}
