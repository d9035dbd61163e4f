// CLI behaviour of the smokehouse binary.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn smokehouse() -> Command {
    let mut cmd = Command::cargo_bin("smokehouse").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn list_shows_embedded_definitions() {
    smokehouse()
        .arg("list")
        .assert()
        .success()
        .stdout(contains("a11y").and(contains("http://localhost:10200/a11y/a11y_tester.html")));
}

#[test]
fn list_reports_skips_on_stdout() {
    smokehouse()
        .args(["list", "--skip", "a11y:no axe today"])
        .assert()
        .success()
        .stdout(
            contains("skipping http://localhost:10200/a11y/a11y_tester.html: no axe today")
                .and(contains("byte-efficiency")),
        );
}

#[test]
fn dump_keeps_stdout_as_json() {
    let output = smokehouse()
        .args(["dump", "--url-filter", "/byte-efficiency/", "--jobs", "3", "--skip", "oopif"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tests = json["tests"].as_array().unwrap();
    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0]["id"], "byte-efficiency");
    assert_eq!(json["options"]["jobs"], 3);
    // oopif is already gone by url filter, so nothing was skipped.
    assert!(!String::from_utf8_lossy(&output.stderr).contains("skipping"));
}

#[test]
fn url_filter_accepts_a_slashed_bare_body() {
    let output = smokehouse()
        .args(["dump", "--url-filter", "/seo/seo-tester"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tests = json["tests"].as_array().unwrap();
    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0]["id"], "seo-passing");
}

#[test]
fn dump_encodes_patterns_with_the_sentinel() {
    smokehouse()
        .args(["dump", "--url-filter", "/infinite-loop/"])
        .assert()
        .success()
        .stdout(contains("__REGEXP /PAGE_HUNG/"));
}

#[test]
fn diff_shows_rule_changes() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("smokehouse.yaml");
    fs::write(
        &config,
        "rules:\n  modify:\n    - id: seo-passing\n      set:\n        lhr.audits.canonical.score: 0\n",
    )
    .unwrap();

    smokehouse()
        .arg("diff")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(
            contains("--- seo-passing:")
                .and(contains("\"score\": 0"))
                .and(contains("No expectations changed.").not()),
        );
}

#[test]
fn loads_corpus_from_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus.json");
    fs::write(
        &corpus,
        r#"[{"id": "custom", "expectations": [{"lhr": {"requestedUrl": "http://custom.test/"}}]}]"#,
    )
    .unwrap();

    smokehouse()
        .arg("list")
        .arg("--corpus")
        .arg(&corpus)
        .assert()
        .success()
        .stdout(contains("custom").and(contains("a11y").not()));
}

#[test]
fn bad_config_reports_miette_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.yaml");
    fs::write(&config, "not_a_key: true\n").unwrap();

    smokehouse()
        .arg("list")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("smokehouse::config"));
}

#[test]
fn zero_jobs_is_rejected() {
    smokehouse()
        .args(["list", "--jobs", "0"])
        .assert()
        .failure()
        .stderr(contains("--jobs must be at least 1"));
}
