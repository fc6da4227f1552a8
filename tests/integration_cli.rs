/// CLI integration tests for rule-extract.
///
/// These tests invoke the compiled binary end-to-end: `seed` loads
/// demos/iris.csv into a scratch SQLite database and `extract` fits it.
///
/// NOTE: the extract tests require Python with scikit-learn (CART) or
/// wittgenstein (RIPPERk, IREP). They are skipped gracefully if the modules
/// are not available.
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::{TempDir, tempdir};

const BIN: &str = env!("CARGO_BIN_EXE_rule-extract");

/// Returns true if a Python on PATH can import every module.
fn python_has(modules: &str) -> bool {
    ["python3", "python"].iter().any(|python| {
        Command::new(python)
            .args(["-c", &format!("import {modules}")])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

fn seeded_iris() -> (TempDir, PathBuf) {
    let tmp = tempdir().expect("tempdir");
    let db = tmp.path().join("iris.db");
    let status = Command::new(BIN)
        .args(["seed", "--csv", "demos/iris.csv", "--table", "iris", "--database"])
        .arg(&db)
        .status()
        .expect("failed to spawn rule-extract binary");
    assert!(status.success(), "seed command failed");
    (tmp, db)
}

fn extract(db: &Path, algorithm: &str) -> std::process::Output {
    Command::new(BIN)
        .args(["extract", "--algorithm", algorithm, "--table", "iris"])
        .args(["--random-state", "1", "--database"])
        .arg(db)
        .output()
        .expect("failed to spawn rule-extract binary")
}

#[test]
fn extract_cart_prints_one_rule_per_leaf() {
    if !python_has("numpy, sklearn") {
        eprintln!("SKIP: python with scikit-learn not available");
        return;
    }
    let (_tmp, db) = seeded_iris();
    let output = extract(&db, "CART");
    assert!(
        output.status.success(),
        "extract failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("extracted_rule_based_model: [\n\n"));
    assert!(stdout.trim_end().ends_with("\n\n]"));
    let rules: Vec<&str> = stdout.lines().filter(|l| l.contains(" => ")).collect();
    // The two species are separable with one split.
    assert_eq!(rules.len(), 2, "unexpected ruleset:\n{stdout}");
    assert!(rules.iter().any(|r| r.ends_with("=> setosa")));
    assert!(rules.iter().any(|r| r.ends_with("=> versicolor")));
    assert!(!stdout.contains("() =>"), "trees carry no default rule");
}

#[test]
fn extract_rule_lists_end_with_default_rule() {
    if !python_has("pandas, wittgenstein") {
        eprintln!("SKIP: python with wittgenstein not available");
        return;
    }
    let (_tmp, db) = seeded_iris();
    for algorithm in ["RIPPERk", "IREP"] {
        let output = extract(&db, algorithm);
        assert!(
            output.status.success(),
            "{algorithm} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.starts_with("extracted_rule_based_model: [\n\n"));
        assert!(
            stdout.contains("() => setosa\n"),
            "{algorithm} default rule missing:\n{stdout}"
        );
        assert!(!stdout.contains("X0X"), "tokens must be decoded");
    }
}

#[test]
fn extract_unsupported_algorithm_exits_nonzero() {
    let (_tmp, db) = seeded_iris();
    let output = extract(&db, "C4.5");
    assert!(!output.status.success(), "expected non-zero exit for C4.5");
    assert!(output.stdout.is_empty(), "no partial output");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("C4.5"), "stderr: {stderr}");
}

#[test]
fn extract_missing_database_exits_nonzero() {
    let tmp = tempdir().expect("tempdir");
    let output = extract(&tmp.path().join("nowhere.db"), "CART");
    assert!(
        !output.status.success(),
        "expected non-zero exit for missing database"
    );
    assert!(output.stdout.is_empty());

    let status = Command::new(BIN)
        .args(["extract", "--algorithm", "CART", "--table", "iris"])
        .status()
        .expect("failed to spawn rule-extract binary");
    assert!(!status.success(), "expected non-zero exit without --database");
}

#[test]
fn seed_missing_csv_exits_nonzero() {
    let tmp = tempdir().expect("tempdir");
    let status = Command::new(BIN)
        .args(["seed", "--csv", "demos/does_not_exist.csv", "--table", "t", "--database"])
        .arg(tmp.path().join("out.db"))
        .status()
        .expect("failed to spawn rule-extract binary");
    assert!(!status.success(), "expected non-zero exit for missing CSV");
}
