use assert_fs::TempDir;
use assert_fs::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

const PIPELINE_CONFIG: &str = include_str!("fixtures/pipeline_config.py");
const PIPELINE_CONFIG_EXPECTED: &str = include_str!("fixtures/pipeline_config.expected.py");
const FEATURE_ENGINEERING: &str = include_str!("fixtures/feature_engineering.py");
const FEATURE_ENGINEERING_EXPECTED: &str = include_str!("fixtures/feature_engineering.expected.py");
const MAIN_PY: &str = include_str!("fixtures/main.py");
const MAIN_PY_EXPECTED: &str = include_str!("fixtures/main.expected.py");
const CLAUDE_MD: &str = include_str!("fixtures/CLAUDE.md");
const CLAUDE_MD_EXPECTED: &str = include_str!("fixtures/CLAUDE.expected.md");
const PYPROJECT: &str = include_str!("fixtures/pyproject.toml");
const PYPROJECT_EXPECTED: &str = include_str!("fixtures/pyproject.expected.toml");

struct Run {
    success: bool,
    stdout: String,
    stderr: String,
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("src/config/pipeline_config.py")
        .write_str(PIPELINE_CONFIG)
        .unwrap();
    temp.child("src/features/feature_engineering.py")
        .write_str(FEATURE_ENGINEERING)
        .unwrap();
    temp.child("main.py").write_str(MAIN_PY).unwrap();
    temp.child("CLAUDE.md").write_str(CLAUDE_MD).unwrap();
    temp.child("pyproject.toml").write_str(PYPROJECT).unwrap();
    temp
}

fn migrate(base: &Path, extra: &[&str]) -> Run {
    let output = Command::new(assert_cmd::cargo::cargo_bin("mg-migrate"))
        .arg("--base-dir")
        .arg(base)
        .args(extra)
        .env("NO_COLOR", "1")
        .output()
        .unwrap();
    Run {
        success: output.status.success(),
        stdout: String::from_utf8(output.stdout).unwrap(),
        stderr: String::from_utf8(output.stderr).unwrap(),
    }
}

fn read(base: &Path, rel: &str) -> String {
    fs::read_to_string(base.join(rel)).unwrap()
}

#[test]
fn test_migrates_project() {
    let temp = project();
    let run = migrate(temp.path(), &[]);

    assert!(run.success, "stderr: {}", run.stderr);
    assert_eq!(
        read(temp.path(), "src/features/feature_engineering.py"),
        FEATURE_ENGINEERING_EXPECTED
    );
    assert_eq!(read(temp.path(), "main.py"), MAIN_PY_EXPECTED);
    assert_eq!(read(temp.path(), "CLAUDE.md"), CLAUDE_MD_EXPECTED);
    assert_eq!(read(temp.path(), "pyproject.toml"), PYPROJECT_EXPECTED);

    assert_eq!(
        read(temp.path(), "src/config/pipeline_config.py"),
        PIPELINE_CONFIG_EXPECTED
    );

    assert!(run.stdout.contains("Updating "));
    assert!(run.stdout.contains("pipeline_config.py..."));
    assert!(run.stdout.contains("Updated "));
    assert!(run.stdout.contains("enhanced_features.py (not found)"));
    assert!(run.stdout.contains("Skipping "));
    assert!(run.stdout.contains("Migration completed successfully!"));
}

#[test]
fn test_second_run_changes_nothing() {
    let temp = project();
    assert!(migrate(temp.path(), &[]).success);

    let files = [
        "src/config/pipeline_config.py",
        "src/features/feature_engineering.py",
        "main.py",
        "CLAUDE.md",
        "pyproject.toml",
    ];
    let first: Vec<String> = files.iter().map(|f| read(temp.path(), f)).collect();

    let run = migrate(temp.path(), &[]);
    assert!(run.success, "stderr: {}", run.stderr);
    assert!(run.stdout.contains("(no changes)"));
    assert!(!run.stdout.contains("Updated "));

    let second: Vec<String> = files.iter().map(|f| read(temp.path(), f)).collect();
    assert_eq!(first, second);
}

#[test]
fn test_dry_run_leaves_files_untouched() {
    let temp = project();
    let run = migrate(temp.path(), &["--dry-run"]);

    assert!(run.success, "stderr: {}", run.stderr);
    assert!(run.stdout.contains("-    target_column: str = \"Potassium\""));
    assert!(run.stdout.contains("+    target_column: str = \"Magnesium %\""));
    assert!(run.stdout.contains("Dry run complete"));
    assert_eq!(read(temp.path(), "src/config/pipeline_config.py"), PIPELINE_CONFIG);
    assert_eq!(read(temp.path(), "pyproject.toml"), PYPROJECT);
}

#[test]
fn test_drift_fails_one_file_but_migrates_the_rest() {
    let temp = project();
    temp.child("pyproject.toml")
        .write_str("[project]\nname = \"kalium-pipeline\"\n")
        .unwrap();

    let run = migrate(temp.path(), &[]);

    assert!(!run.success);
    assert!(run.stderr.contains("required rule `package name` matched nothing"));
    assert!(run.stderr.contains("Migration failed for 1 file(s)"));
    assert_eq!(read(temp.path(), "pyproject.toml"), "[project]\nname = \"kalium-pipeline\"\n");
    assert_eq!(read(temp.path(), "main.py"), MAIN_PY_EXPECTED);
    assert!(!run.stdout.contains("Migration completed successfully!"));
}

#[test]
fn test_empty_directory_only_skips() {
    let temp = TempDir::new().unwrap();
    let run = migrate(temp.path(), &[]);

    assert!(run.success, "stderr: {}", run.stderr);
    assert_eq!(run.stdout.matches("(not found)").count(), 9);
    assert!(!run.stdout.contains("Updating "));
}
