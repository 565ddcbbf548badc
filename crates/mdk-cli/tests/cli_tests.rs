//! Integration tests for the MDK CLI
//!
//! These tests verify the CLI behavior end-to-end

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Helper function to create a test CLI command
#[allow(deprecated)]
fn cli() -> Command {
    let mut command = Command::cargo_bin("mdk").unwrap();
    command.arg("--no-color");
    command
}

/// Helper function to create a project directory with one script file
fn create_test_project(source: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("Program.cs"), source).unwrap();
    temp_dir
}

const PROGRAM: &str = "class Program\n{\n    // greeting\n    const string Greeting = \"v$VERSION$\";\n\n    public void Main()\n    {\n        Echo(Greeting);\n    }\n}\n";

fn script(root: &Path) -> String {
    fs::read_to_string(root.join("out").join("Script.cs")).unwrap()
}

#[test]
fn test_version_command() {
    cli()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(VERSION));
}

#[test]
fn test_help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pack"))
        .stdout(predicate::str::contains("minify"));
}

#[test]
fn test_pack_writes_script() {
    let project = create_test_project(PROGRAM);

    cli()
        .arg("pack")
        .arg(project.path())
        .args(["--minify", "lite", "--macro", "VERSION=2.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Packed"));

    let packed = script(project.path());
    assert!(packed.contains("\"v2.0\""), "{packed}");
    assert!(!packed.contains("greeting"), "{packed}");
}

#[test]
fn test_pack_multiple_projects() {
    let first = create_test_project(PROGRAM);
    let second = create_test_project("class Program { void Main() { } }\n");

    cli()
        .arg("pack")
        .arg(first.path())
        .arg(second.path())
        .assert()
        .success();

    assert!(first.path().join("out").join("Script.cs").is_file());
    assert!(second.path().join("out").join("Script.cs").is_file());
}

#[test]
fn test_pack_dry_run_writes_nothing() {
    let project = create_test_project(PROGRAM);

    cli()
        .arg("pack")
        .arg(project.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[dry run]"));

    assert!(!project.path().join("out").exists());
}

#[test]
fn test_pack_reads_config_file() {
    let project = create_test_project(PROGRAM);
    fs::write(
        project.path().join("mdk.toml"),
        "output = \"dist\"\nminify = \"stripcomments\"\n",
    )
    .unwrap();

    cli().arg("pack").arg(project.path()).assert().success();

    let packed = fs::read_to_string(project.path().join("dist").join("Script.cs")).unwrap();
    assert!(!packed.contains("greeting"), "{packed}");
}

#[test]
fn test_pack_reports_parse_errors() {
    let project = create_test_project("class A { int ; }\n");

    cli()
        .arg("pack")
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to pack"));

    assert!(!project.path().join("out").exists());
}

#[test]
fn test_invalid_minifier_level_is_rejected() {
    let project = create_test_project(PROGRAM);

    cli()
        .arg("pack")
        .arg(project.path())
        .args(["--minify", "extreme"])
        .assert()
        .failure();
}

#[test]
fn test_minify_prints_to_stdout() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("Script.cs");
    fs::write(&file, "class Program\n{\n    // hi\n    int a = 1;\n}\n").unwrap();

    cli()
        .arg("minify")
        .arg(&file)
        .args(["--level", "full"])
        .assert()
        .success()
        .stdout(predicate::str::contains("class Program{int a=1;}"))
        .stdout(predicate::str::contains("//").not());
}
