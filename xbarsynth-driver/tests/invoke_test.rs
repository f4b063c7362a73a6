// SPDX-License-Identifier: Apache-2.0

use std::process::Command;

use pretty_assertions::assert_eq;
use test_case::test_case;

const AND2_JSON: &str = r#"{
  "name": "f",
  "nodes": [
    {"variable": "a", "root": true, "output_variables": ["f"]},
    {"variable": "b"},
    {"variable": "1", "terminal": true}
  ],
  "edges": [
    {"source": 0, "target": 1, "literal": {"atom": "a", "positive": true}},
    {"source": 1, "target": 2, "literal": {"atom": "b", "positive": true}}
  ]
}"#;

fn driver() -> Command {
    Command::new(env!("CARGO_BIN_EXE_xbarsynth-driver"))
}

fn write_temp(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write temp file");
    path
}

#[test]
fn test_version() {
    let output = driver().arg("version").output().expect("driver should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        env!("CARGO_PKG_VERSION")
    );
}

#[test_case("compact"; "compact")]
#[test_case("direct"; "direct")]
#[test_case("path"; "path")]
fn test_synthesize_then_evaluate(subcommand: &str) {
    let dir = tempfile::tempdir().expect("tempdir");
    let diagram = write_temp(&dir, "and2.json", AND2_JSON);
    let xbar = dir.path().join("and2.xbar");
    let report = dir.path().join("report.json");

    let output = driver()
        .arg(subcommand)
        .arg(&diagram)
        .arg("--output")
        .arg(&xbar)
        .arg("--report")
        .arg(&report)
        .output()
        .expect("driver should run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(report[0]["method"], subcommand);

    for (a, b) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        let output = driver()
            .arg("eval")
            .arg(&xbar)
            .arg("--instance")
            .arg(format!("a={},b={}", a, b))
            .output()
            .expect("driver should run");
        assert!(output.status.success());
        let got: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(got["f"], serde_json::Value::Bool(a == 1 && b == 1));
    }
}

#[test]
fn test_config_file_and_flag_override() {
    let dir = tempfile::tempdir().expect("tempdir");
    let diagram = write_temp(&dir, "and2.json", AND2_JSON);
    let config = write_temp(&dir, "xbarsynth.toml", "[synth]\ngamma = 3.0\n");

    let rejected = driver()
        .arg("--config")
        .arg(&config)
        .arg("compact")
        .arg(&diagram)
        .output()
        .expect("driver should run");
    assert_eq!(rejected.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&rejected.stderr).contains("gamma"));

    let accepted = driver()
        .arg("--config")
        .arg(&config)
        .arg("compact")
        .arg(&diagram)
        .arg("--gamma")
        .arg("1.0")
        .output()
        .expect("driver should run");
    assert!(accepted.status.success());
    assert!(String::from_utf8_lossy(&accepted.stdout).starts_with(".model f\n"));
}

#[test]
fn test_iso_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let g = AND2_JSON
        .replace("\"name\": \"f\"", "\"name\": \"g\"")
        .replace("[\"f\"]", "[\"g\"]");
    let design = format!(
        r#"{{"diagrams": {{"f": {}, "g": {}}}}}"#,
        AND2_JSON, g
    );
    let design = write_temp(&dir, "design.json", &design);

    let output = driver()
        .arg("iso")
        .arg(&design)
        .arg("--capacity")
        .arg("8")
        .output()
        .expect("driver should run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["patterns"].as_array().unwrap().len(), 1);
    assert_eq!(report["before"]["rows"], 6);
    assert_eq!(report["after"]["rows"], 3);
    assert_eq!(report["schedule"]["cycles"][0][0]["type"], "LOAD");
}

#[test]
fn test_missing_input_reports_error() {
    let output = driver()
        .arg("direct")
        .arg("/nonexistent/diagram.json")
        .output()
        .expect("driver should run");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("xbarsynth-driver: direct: "), "{}", stderr);
}
