#![allow(clippy::unwrap_used)]

//! End-to-end tests that drive the compiled `exec-stub` binary: build a proxy
//! from the template, then run the proxy and check what the shell executed.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn template() -> Command {
    let mut cmd = Command::cargo_bin("exec-stub").unwrap();
    cmd.env_remove("EXEC_STUB_READER").env_remove("EXEC_STUB_LOG");
    cmd
}

fn build_proxy(dir: &TempDir, name: &str, command: &[&str]) -> PathBuf {
    let output = dir.path().join(name);
    template()
        .arg("-o")
        .arg(&output)
        .arg("-c")
        .args(command)
        .assert()
        .success()
        .stderr(predicate::str::contains("File written successfully"));
    output
}

fn proxy(path: &Path) -> Command {
    let mut cmd = Command::new(path);
    cmd.env_remove("EXEC_STUB_READER").env_remove("EXEC_STUB_LOG");
    cmd
}

#[test]
fn usage_error_without_output() {
    let dir = TempDir::new().unwrap();
    template()
        .current_dir(dir.path())
        .args(["-c", "echo", "hi"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("-o"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn usage_error_without_command() {
    template()
        .args(["-o", "somewhere"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn usage_error_for_dangling_output_flag() {
    template().arg("-o").assert().code(1);
}

#[test]
fn copy_error_for_missing_directory() {
    let dir = TempDir::new().unwrap();
    template()
        .arg("-o")
        .arg(dir.path().join("missing").join("proxy"))
        .args(["-c", "echo"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cannot copy"));
}

#[test]
fn proxy_starts_with_template_bytes() {
    let dir = TempDir::new().unwrap();
    let out = build_proxy(&dir, "proxy", &["echo", "hello"]);

    let template_bytes = fs::read(assert_cmd::cargo::cargo_bin("exec-stub")).unwrap();
    let proxy_bytes = fs::read(&out).unwrap();
    assert!(proxy_bytes.starts_with(&template_bytes));
    assert!(proxy_bytes.ends_with(b"echo hello\x0a\x00\x00\x00EXEC"));
}

#[cfg(unix)]
#[test]
fn proxy_runs_embedded_command() {
    let dir = TempDir::new().unwrap();
    let out = build_proxy(&dir, "greet", &["echo", "hello", "world"]);

    proxy(&out).assert().success().stdout("hello world\n");
}

#[cfg(unix)]
#[test]
fn proxy_forwards_extra_arguments() {
    let dir = TempDir::new().unwrap();
    let out = build_proxy(&dir, "greet", &["echo", "hello", "world"]);

    proxy(&out).arg("extra").assert().success().stdout("hello world extra\n");
}

#[cfg(unix)]
#[test]
fn arguments_with_spaces_stay_single_words() {
    let dir = TempDir::new().unwrap();
    let out = build_proxy(&dir, "count", &["printf", "%s,", "a b"]);

    proxy(&out)
        .arg("c d")
        .arg("e")
        .assert()
        .success()
        .stdout("a b,c d,e,");
}

#[cfg(unix)]
#[test]
fn proxy_exit_code_is_childs() {
    let dir = TempDir::new().unwrap();
    let out = build_proxy(&dir, "fail", &["exit"]);

    proxy(&out).arg("7").assert().code(7);
    proxy(&out).arg("0").assert().success();
}

#[cfg(unix)]
#[test]
fn proxy_ignores_build_flags() {
    let dir = TempDir::new().unwrap();
    let out = build_proxy(&dir, "echoer", &["echo"]);

    proxy(&out)
        .args(["-o", "x", "-c", "y"])
        .assert()
        .success()
        .stdout("-o x -c y\n");
    assert!(!dir.path().join("x").exists());
}

#[cfg(unix)]
#[test]
fn both_read_strategies_run_the_same_command() {
    let dir = TempDir::new().unwrap();
    let out = build_proxy(&dir, "greet", &["echo", "same"]);

    for reader in ["seek", "map", "auto"] {
        proxy(&out)
            .env("EXEC_STUB_READER", reader)
            .assert()
            .success()
            .stdout("same\n");
    }
}

#[cfg(unix)]
#[test]
fn stacked_trailer_uses_the_last_one() {
    let dir = TempDir::new().unwrap();
    let out = build_proxy(&dir, "stacked", &["echo", "first"]);

    let mut file = OpenOptions::new().append(true).open(&out).unwrap();
    let payload = b"echo second";
    file.write_all(payload).unwrap();
    file.write_all(&(payload.len() as u32).to_le_bytes()).unwrap();
    file.write_all(b"EXEC").unwrap();
    drop(file);

    proxy(&out).assert().success().stdout("second\n");
}

#[test]
fn corrupt_trailer_is_reported() {
    let dir = TempDir::new().unwrap();
    let broken = dir.path().join(format!("broken{}", std::env::consts::EXE_SUFFIX));
    fs::copy(assert_cmd::cargo::cargo_bin("exec-stub"), &broken).unwrap();

    let mut file = OpenOptions::new().append(true).open(&broken).unwrap();
    file.write_all(&u32::MAX.to_le_bytes()).unwrap();
    file.write_all(b"EXEC").unwrap();
    drop(file);

    proxy(&broken)
        .current_dir(dir.path())
        .args(["-o", "out", "-c", "echo"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("corrupt trailer"));
    assert!(!dir.path().join("out").exists());
}
