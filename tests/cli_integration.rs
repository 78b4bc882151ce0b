//! CLI integration tests for gpp.
//!
//! These tests drive the `gpp` binary end to end with a scripted compiler.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the gpp binary command, isolated from the user's global config.
fn gpp(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gpp").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("GPP_CONFIG");
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write_source(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, "int main(void) { return 0; }\n").unwrap();
    path
}

/// Write a compiler script that prints `stderr` and exits with `code`,
/// plus a config file pointing both toolchains at it.
#[cfg(unix)]
fn fake_toolchain(dir: &Path, stderr: &str, code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let stderr_file = dir.join("cc.stderr");
    fs::write(&stderr_file, stderr).unwrap();
    let script = dir.join("fake-cc");
    fs::write(
        &script,
        format!("#!/bin/sh\ncat '{}' >&2\nexit {}\n", stderr_file.display(), code),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let config = dir.join("gpp.toml");
    fs::write(
        &config,
        format!(
            "cCompiler = \"{0}\"\ncppCompiler = \"{0}\"\ncompileToTempDirectory = false\n",
            script.display()
        ),
    )
    .unwrap();
    config
}

// ============================================================================
// gpp build
// ============================================================================

#[test]
fn test_build_missing_file_asks_to_save() {
    let tmp = temp_dir();

    gpp(tmp.path())
        .args(["build", "untitled.c", "--no-run", "--no-color"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Save before compiling"));
}

#[test]
fn test_build_unsupported_language() {
    let tmp = temp_dir();
    write_source(tmp.path(), "main.rs");

    gpp(tmp.path())
        .args(["build", "main.rs", "--no-run", "--no-color"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported language `.rs`"));
}

#[cfg(unix)]
#[test]
fn test_build_success_without_run() {
    let tmp = temp_dir();
    write_source(tmp.path(), "main.c");
    fs::write(tmp.path().join("compiling_error.txt"), "stale").unwrap();
    let config = fake_toolchain(tmp.path(), "", 0);

    gpp(tmp.path())
        .args(["build", "main.c", "--no-run", "--no-color", "--config"])
        .arg(&config)
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Compiling successful"));

    assert!(!tmp.path().join("compiling_error.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_build_failure_writes_errors_file() {
    let tmp = temp_dir();
    write_source(tmp.path(), "main.c");
    let stderr = "main.c:10:5: error: expected ';' before 'return'\n";
    let config = fake_toolchain(tmp.path(), stderr, 1);

    gpp(tmp.path())
        .args(["build", "main.c", "--no-run", "--no-color", "--config"])
        .arg(&config)
        .current_dir(tmp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("expected ';' before 'return'"));

    let written = fs::read_to_string(tmp.path().join("compiling_error.txt")).unwrap();
    assert_eq!(written, stderr);
}

#[cfg(unix)]
#[test]
fn test_build_warning_succeeds() {
    let tmp = temp_dir();
    write_source(tmp.path(), "main.c");
    let config = fake_toolchain(tmp.path(), "main.c:3:1: warning: unused variable\n", 0);

    gpp(tmp.path())
        .args(["build", "main.c", "--no-run", "--no-color", "--config"])
        .arg(&config)
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: main.c:3:1: warning: unused variable"));
}

#[cfg(unix)]
#[test]
fn test_build_json_summary() {
    let tmp = temp_dir();
    write_source(tmp.path(), "main.c");
    let config = fake_toolchain(tmp.path(), "main.c:10:5: error: boom\n", 1);

    gpp(tmp.path())
        .args(["build", "main.c", "--no-run", "--message-format", "json", "--config"])
        .arg(&config)
        .current_dir(tmp.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"reason\":\"build-finished\""))
        .stdout(predicate::str::contains("\"outcome\":\"failure\""))
        .stdout(predicate::str::contains("\"line\":10"))
        .stderr(predicate::str::contains("\"level\":\"error\""));
}

// ============================================================================
// gpp errors
// ============================================================================

#[test]
fn test_errors_lists_diagnostics_for_file() {
    let tmp = temp_dir();
    write_source(tmp.path(), "main.c");
    fs::write(
        tmp.path().join("compiling_error.txt"),
        "main.c: In function 'main':\nmain.c:4:2: error: a\nother.c:1:1: error: b\nmain.c:9:3: error: c\n",
    )
    .unwrap();

    gpp(tmp.path())
        .args(["errors", "main.c"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("main.c:4:2: error: a"))
        .stdout(predicate::str::contains("main.c:9:3: error: c"))
        .stdout(predicate::str::contains("other.c").not());
}

#[test]
fn test_errors_next_wraps_around() {
    let tmp = temp_dir();
    write_source(tmp.path(), "main.c");
    fs::write(
        tmp.path().join("compiling_error.txt"),
        "main.c:1:1: error: first\nmain.c:2:1: error: second\n",
    )
    .unwrap();

    let output = gpp(tmp.path())
        .args(["errors", "main.c", "--next", "3"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("first"));
    assert!(lines[1].ends_with("second"));
    assert!(lines[2].ends_with("first"));
}

#[test]
fn test_errors_without_failed_build() {
    let tmp = temp_dir();
    write_source(tmp.path(), "main.c");

    gpp(tmp.path())
        .args(["errors", "main.c", "--prev", "1"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("no errors recorded"));
}

// ============================================================================
// gpp config / terminals
// ============================================================================

#[test]
fn test_config_reads_project_file() {
    let tmp = temp_dir();
    fs::create_dir(tmp.path().join(".gpp")).unwrap();
    fs::write(
        tmp.path().join(".gpp/config.toml"),
        "c_compiler = \"clang\"\nlinuxTerminal = \"Konsole\"\n",
    )
    .unwrap();

    gpp(tmp.path())
        .args(["config"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("c_compiler = \"clang\""))
        .stdout(predicate::str::contains("linux_terminal = \"Konsole\""))
        .stdout(predicate::str::contains("cpp_compiler = \"g++\""));
}

#[test]
fn test_terminals_lists_table() {
    let tmp = temp_dir();

    gpp(tmp.path())
        .args(["terminals"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("XTerm"))
        .stdout(predicate::str::contains("gnome-terminal"))
        .stdout(predicate::str::contains("--command"));
}

#[test]
fn test_completions() {
    let tmp = temp_dir();

    gpp(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gpp"));
}
