//! Integration tests for the CLI application
//!
//! These tests verify that the CLI commands work correctly with real data files.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

/// Helper to create test data files
struct TestDataFiles {
    pub train_file: NamedTempFile,
    pub test_file: NamedTempFile,
}

impl TestDataFiles {
    fn new() -> std::io::Result<Self> {
        let mut train_file = NamedTempFile::new()?;
        writeln!(train_file, "+1,2.0,1.0")?;
        writeln!(train_file, "-1,-2.0,-1.0")?;
        writeln!(train_file, "+1,1.5,0.8")?;
        writeln!(train_file, "-1,-1.5,-0.8")?;
        writeln!(train_file, "+1,1.8,0.9")?;
        writeln!(train_file, "-1,-1.8,-0.9")?;
        train_file.flush()?;

        let mut test_file = NamedTempFile::new()?;
        writeln!(test_file, "+1 1.6 0.7")?;
        writeln!(test_file, "-1 -1.6 -0.7")?;
        test_file.flush()?;

        Ok(TestDataFiles {
            train_file,
            test_file,
        })
    }
}

fn rbfsvm(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rbfsvm"))
        .args(args)
        .output()
        .expect("Failed to run CLI")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

fn train(data: &TestDataFiles, model_path: &Path, extra: &[&str]) -> Output {
    let mut args = vec![
        "train",
        "-a",
        "2",
        "-x",
        "6",
        "-f",
        path_str(data.train_file.path()),
        "-m",
        path_str(model_path),
    ];
    args.extend_from_slice(extra);
    rbfsvm(&args)
}

#[test]
fn test_cli_train_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.txt");

    let output = train(&test_data, &model_path, &["-c", "1.0", "-e", "0.001", "-n", "100"]);

    assert!(
        output.status.success(),
        "Train command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(model_path.exists(), "Model file was not created");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Converged at iteration number"));
    assert!(stdout.contains("Training accuracy: 1"));

    // gamma, b, then one line per support vector
    let model = fs::read_to_string(&model_path).unwrap();
    let lines: Vec<&str> = model.lines().collect();
    assert_eq!(lines[0], "0.5");
    assert!(lines[1].parse::<f64>().is_ok());
    assert!(lines.len() > 2);
    assert!(lines[2..].iter().all(|l| l.split(',').count() == 4));
}

#[test]
fn test_cli_train_sequential_with_summary() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.txt");
    let summary_path = temp_dir.path().join("summary.json");

    let output = train(
        &test_data,
        &model_path,
        &["--sequential", "-g", "0.25", "--summary", path_str(&summary_path)],
    );
    assert!(
        output.status.success(),
        "Train command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(summary["backend"], "sequential");
    assert_eq!(summary["status"], "converged");
    assert_eq!(summary["num_examples"], 6);
    assert_eq!(summary["config"]["gamma"], 0.25);
    assert_eq!(summary["training_accuracy"], 1.0);
}

#[test]
fn test_cli_reports_iteration_budget() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.txt");

    let output = train(&test_data, &model_path, &["-n", "1"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Could not converge in 1 iterations"));
    assert!(model_path.exists());
}

#[test]
fn test_cli_evaluate_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.txt");

    assert!(train(&test_data, &model_path, &[]).status.success());

    let output = rbfsvm(&[
        "evaluate",
        "-m",
        path_str(&model_path),
        "-f",
        path_str(test_data.test_file.path()),
        "-a",
        "2",
        "-x",
        "2",
        "--detailed",
    ]);

    assert!(
        output.status.success(),
        "Evaluate command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Accuracy: 100.00%"));
    assert!(stdout.contains("Precision"));

    let sequential = rbfsvm(&[
        "evaluate",
        "-m",
        path_str(&model_path),
        "-f",
        path_str(test_data.test_file.path()),
        "-a",
        "2",
        "-x",
        "2",
        "--sequential",
    ]);
    assert!(sequential.status.success());
    assert!(String::from_utf8_lossy(&sequential.stdout).contains("Accuracy: 100.00%"));
}

#[test]
fn test_cli_info_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.txt");

    assert!(train(&test_data, &model_path, &[]).status.success());

    let output = rbfsvm(&["info", path_str(&model_path)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Gamma: 0.5"));
    assert!(stdout.contains("Support Vectors:"));
}

#[test]
fn test_cli_error_handling() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.txt");

    // Missing training file
    let output = rbfsvm(&[
        "train",
        "-a",
        "2",
        "-x",
        "6",
        "-f",
        "/nonexistent/train.csv",
        "-m",
        path_str(&model_path),
    ]);
    assert!(!output.status.success());
    assert!(!model_path.exists());

    // Invalid parameter
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let output = train(&test_data, &model_path, &["-c", "0"]);
    assert!(!output.status.success());

    // Fewer rows than declared
    let output = rbfsvm(&[
        "train",
        "-a",
        "2",
        "-x",
        "10",
        "-f",
        path_str(test_data.train_file.path()),
        "-m",
        path_str(&model_path),
    ]);
    assert!(!output.status.success());

    // Missing model file
    let output = rbfsvm(&["info", "/nonexistent/model.txt"]);
    assert!(!output.status.success());
}
