use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const REPORT: &str = r#"{
  "shannon": {
    "body-site": {
      "columns": ["body-site", "depth", "count", "min", "50%", "max"],
      "data": [
        ["gut", 10, 3, 1.0, 2.0, 3.0],
        ["tongue", 10, 3, 1.5, 2.5, 3.5],
        ["gut", 20, 3, 2.0, 3.0, 4.0],
        ["tongue", 20, 3, 2.5, 3.5, 4.5]
      ]
    }
  },
  "observed_features": {
    "columns": ["sample-id", "depth", "count", "min", "50%", "max"],
    "data": [
      ["S1", 10, 3, 10, 12, 14],
      ["S1", 20, 3, 15, 18, 20]
    ]
  }
}"#;

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("rarefy").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("rarefy"));
}

#[test]
fn inspect_lists_metrics_and_categories() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("report.json");
    fs::write(&input, REPORT).unwrap();
    let mut cmd = Command::cargo_bin("rarefy").unwrap();
    cmd.args(["inspect", "--input"]).arg(&input);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("shannon: body-site"))
        .stdout(predicate::str::contains("observed_features"));
}

#[test]
fn plot_replays_clicks_and_writes_state() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("report.json");
    fs::write(&input, REPORT).unwrap();
    let out = dir.path().join("chart.svg");
    let state = dir.path().join("state.json");

    let mut cmd = Command::cargo_bin("rarefy").unwrap();
    cmd.args(["plot", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .arg("--state")
        .arg(&state)
        .args(["--click", "dots:gut", "--y-extent", "envelope"]);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("shannon.csv"));

    assert!(fs::metadata(&out).unwrap().len() > 0);
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&state).unwrap()).unwrap();
    assert_eq!(v["metric"], "shannon");
    assert_eq!(v["category"], "body-site");
    assert_eq!(v["state"]["series"]["gut"]["dots_visible"], false);
    assert_eq!(v["state"]["__select_all__"]["dots_visible"], false);
    assert_eq!(v["legend"].as_array().unwrap().len(), 2);
}

#[test]
fn plot_rejects_unknown_metric() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("report.json");
    fs::write(&input, REPORT).unwrap();
    let mut cmd = Command::cargo_bin("rarefy").unwrap();
    cmd.args(["plot", "--metric", "faith_pd", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(dir.path().join("x.svg"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown metric"));
}

#[test]
fn plot_rejects_bad_click() {
    let mut cmd = Command::cargo_bin("rarefy").unwrap();
    cmd.args(["plot", "--input", "x.json", "--out", "x.svg", "--click", "wiggle"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid click"));
}

#[test]
fn plot_rejects_unknown_category() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("report.json");
    fs::write(&input, REPORT).unwrap();
    let out = dir.path().join("x.svg");
    let mut cmd = Command::cargo_bin("rarefy").unwrap();
    cmd.args(["plot", "--metric", "shannon", "--category", "typo", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown category"));
    assert!(!out.exists());
}
