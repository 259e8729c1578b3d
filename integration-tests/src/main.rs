//! Test runner for exec-stub
//!
//! This test runner validates the launcher end to end by:
//! 1. Building proxy binaries from a compiled `exec-stub` template
//! 2. Wrapping the demo binaries (print-args, hash-file, exit-with) in them
//! 3. Running the proxies with and without extra arguments
//! 4. Checking what the wrapped program actually received
//!
//! Usage: test-runner --template <path> --test-binaries <dir> [--work-dir <dir>]

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use sha2::{Digest, Sha256};

/// Executable extension
#[cfg(windows)]
const EXE_EXT: &str = ".exe";
#[cfg(not(windows))]
const EXE_EXT: &str = "";

/// Test configuration
#[derive(Debug, Parser)]
#[command(name = "test-runner", about = "End-to-end checks for exec-stub proxies")]
struct TestConfig {
    /// Path to the exec-stub template binary
    #[arg(long)]
    template: PathBuf,
    /// Directory containing the demo binaries (print-args, hash-file, exit-with)
    #[arg(long)]
    test_binaries: PathBuf,
    /// Working directory for test artifacts (default: temp dir)
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

impl TestConfig {
    fn work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| env::temp_dir().join("exec stub tests"))
    }

    fn demo(&self, name: &str) -> PathBuf {
        self.test_binaries.join(format!("{}{}", name, EXE_EXT))
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.template.exists(),
            "Template not found: {}",
            self.template.display()
        );
        ensure!(
            self.test_binaries.exists(),
            "Test binaries dir not found: {}",
            self.test_binaries.display()
        );
        Ok(())
    }
}

/// Captured result of one process run
struct RunOutput {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

/// Build a proxy at `output_path` whose embedded command is `command`
fn build_proxy<S: AsRef<OsStr>>(config: &TestConfig, output_path: &Path, command: &[S]) -> Result<()> {
    let output = Command::new(&config.template)
        .arg("-o")
        .arg(output_path)
        .arg("-c")
        .args(command)
        .output()
        .context("Failed to run template")?;

    if !output.status.success() {
        bail!(
            "Template failed to build {}: {}",
            output_path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    ensure!(output_path.exists(), "Proxy was not written: {}", output_path.display());
    Ok(())
}

/// Run a proxy and capture its output
fn run_proxy(proxy_path: &Path, extra_args: &[&str], reader: Option<&str>) -> Result<RunOutput> {
    let mut cmd = Command::new(proxy_path);
    cmd.args(extra_args);
    match reader {
        Some(reader) => cmd.env("EXEC_STUB_READER", reader),
        None => cmd.env_remove("EXEC_STUB_READER"),
    };

    let output = cmd
        .output()
        .with_context(|| format!("Failed to run proxy {}", proxy_path.display()))?;

    Ok(RunOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

/// Pull the JSON argument list out of print-args output
fn printed_args(stdout: &str) -> Result<Vec<String>> {
    let line = stdout
        .lines()
        .find_map(|line| line.strip_prefix("ARGS:"))
        .with_context(|| format!("No ARGS line in output: {}", stdout))?;
    serde_json::from_str(line).context("ARGS line is not a JSON string array")
}

fn test_dir(config: &TestConfig, name: &str) -> Result<PathBuf> {
    let dir = config.work_dir().join(name);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create test dir {}", dir.display()))?;
    Ok(dir)
}

/// Test: embedded and runtime arguments reach the wrapped program intact
fn test_argument_forwarding(config: &TestConfig) -> Result<()> {
    println!("  Running test: argument_forwarding");

    let dir = test_dir(config, "argument_forwarding")?;
    let proxy = dir.join(format!("args proxy{}", EXE_EXT));
    let print_args = config.demo("print-args");

    build_proxy(
        config,
        &proxy,
        &[print_args.as_os_str(), OsStr::new("--embedded"), OsStr::new("two words")],
    )?;

    let run = run_proxy(&proxy, &[], None)?;
    ensure!(run.exit_code == 0, "Proxy failed ({}): {}", run.exit_code, run.stderr);
    ensure!(
        printed_args(&run.stdout)? == ["--embedded", "two words"],
        "Unexpected embedded args: {}",
        run.stdout
    );

    let run = run_proxy(&proxy, &["--runtime", "x y", "z"], None)?;
    ensure!(run.exit_code == 0, "Proxy failed ({}): {}", run.exit_code, run.stderr);
    ensure!(
        printed_args(&run.stdout)? == ["--embedded", "two words", "--runtime", "x y", "z"],
        "Unexpected forwarded args: {}",
        run.stdout
    );

    println!("    PASS");
    Ok(())
}

/// Test: a data path with spaces survives as a single argument
fn test_hash_file_quoted_path(config: &TestConfig) -> Result<()> {
    println!("  Running test: hash_file_quoted_path");

    let dir = test_dir(config, "hash_file")?;
    let data_dir = dir.join("data dir");
    fs::create_dir_all(&data_dir).context("Failed to create data dir")?;
    let data_path = data_dir.join("input file.txt");
    let content = b"Hello, World!\n";
    fs::write(&data_path, content).context("Failed to write test data")?;

    let proxy = dir.join(format!("hash_proxy{}", EXE_EXT));
    build_proxy(config, &proxy, &[config.demo("hash-file"), data_path])?;

    let run = run_proxy(&proxy, &[], None)?;
    ensure!(run.exit_code == 0, "Proxy failed ({}): {}", run.exit_code, run.stderr);

    let expected = format!("SHA256:{:x}", Sha256::digest(content));
    ensure!(
        run.stdout.trim() == expected,
        "Unexpected output: {}. Expected '{}'",
        run.stdout,
        expected
    );

    println!("    PASS");
    Ok(())
}

/// Test: the proxy exits with the wrapped program's status
fn test_exit_status(config: &TestConfig) -> Result<()> {
    println!("  Running test: exit_status");

    let dir = test_dir(config, "exit_status")?;
    let proxy = dir.join(format!("exit_proxy{}", EXE_EXT));
    build_proxy(config, &proxy, &[config.demo("exit-with")])?;

    for (arg, expected) in [("0", 0), ("3", 3), ("42", 42)] {
        let run = run_proxy(&proxy, &[arg], None)?;
        ensure!(
            run.exit_code == expected,
            "Expected exit code {} but got {}: {}",
            expected,
            run.exit_code,
            run.stderr
        );
    }

    println!("    PASS");
    Ok(())
}

/// Test: both trailer readers resolve the same command
fn test_reader_strategies(config: &TestConfig) -> Result<()> {
    println!("  Running test: reader_strategies");

    let dir = test_dir(config, "reader_strategies")?;
    let proxy = dir.join(format!("reader_proxy{}", EXE_EXT));
    build_proxy(
        config,
        &proxy,
        &[config.demo("print-args").as_os_str(), OsStr::new("strategy")],
    )?;

    let mut outputs = Vec::new();
    for reader in ["seek", "map", "auto"] {
        let run = run_proxy(&proxy, &["tail"], Some(reader))?;
        ensure!(run.exit_code == 0, "Proxy ({}) failed: {}", reader, run.stderr);
        outputs.push(printed_args(&run.stdout)?);
    }
    ensure!(
        outputs.iter().all(|args| args == &["strategy", "tail"]),
        "Readers disagree: {:?}",
        outputs
    );

    println!("    PASS");
    Ok(())
}

/// Test: a proxy can wrap another proxy
fn test_proxy_chain(config: &TestConfig) -> Result<()> {
    println!("  Running test: proxy_chain");

    let dir = test_dir(config, "proxy_chain")?;
    let inner = dir.join(format!("inner{}", EXE_EXT));
    let outer = dir.join(format!("outer{}", EXE_EXT));

    build_proxy(
        config,
        &inner,
        &[config.demo("print-args").as_os_str(), OsStr::new("inner")],
    )?;
    build_proxy(config, &outer, &[inner.as_os_str(), OsStr::new("outer")])?;

    let run = run_proxy(&outer, &["runtime"], None)?;
    ensure!(run.exit_code == 0, "Outer proxy failed: {}", run.stderr);
    ensure!(
        printed_args(&run.stdout)? == ["inner", "outer", "runtime"],
        "Unexpected chained args: {}",
        run.stdout
    );

    println!("    PASS");
    Ok(())
}

/// Test: malformed build flags write nothing
fn test_usage_errors(config: &TestConfig) -> Result<()> {
    println!("  Running test: usage_errors");

    let dir = test_dir(config, "usage_errors")?;
    let cases: [&[&str]; 3] = [&["-c", "echo"], &["-o"], &["-o", "never"]];

    for args in cases {
        let output = Command::new(&config.template)
            .current_dir(&dir)
            .args(args)
            .output()
            .context("Failed to run template")?;
        ensure!(!output.status.success(), "Expected failure for {:?}", args);
    }
    let leftovers = fs::read_dir(&dir).context("Failed to list test dir")?.count();
    ensure!(leftovers == 0, "Usage errors left {} files behind", leftovers);

    println!("    PASS");
    Ok(())
}

fn main() -> ExitCode {
    println!("=== exec-stub Test Suite ===");
    println!();

    let config = TestConfig::parse();
    if let Err(e) = config.validate() {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }

    // Clean and recreate work directory
    let work_dir = config.work_dir();
    if work_dir.exists() {
        if let Err(e) = fs::remove_dir_all(&work_dir) {
            eprintln!("Warning: Failed to clean work dir: {}", e);
        }
    }
    if let Err(e) = fs::create_dir_all(&work_dir) {
        eprintln!("Error: Failed to create work dir: {}", e);
        return ExitCode::from(1);
    }

    println!("Configuration:");
    println!("  Template:      {}", config.template.display());
    println!("  Test binaries: {}", config.test_binaries.display());
    println!("  Work dir:      {}", work_dir.display());
    println!();

    let tests: Vec<(&str, fn(&TestConfig) -> Result<()>)> = vec![
        ("argument_forwarding", test_argument_forwarding),
        ("hash_file_quoted_path", test_hash_file_quoted_path),
        ("exit_status", test_exit_status),
        ("reader_strategies", test_reader_strategies),
        ("proxy_chain", test_proxy_chain),
        ("usage_errors", test_usage_errors),
    ];

    let mut passed = 0;
    let mut failed = 0;

    println!("Running {} tests...", tests.len());
    println!();

    for (name, test_fn) in &tests {
        match test_fn(&config) {
            Ok(()) => passed += 1,
            Err(e) => {
                println!("  FAILED ({}): {:#}", name, e);
                failed += 1;
            }
        }
    }

    println!();
    println!("=== Results ===");
    println!("Passed: {}", passed);
    println!("Failed: {}", failed);
    println!();

    if failed > 0 {
        ExitCode::from(1)
    } else {
        println!("All tests passed!");
        ExitCode::SUCCESS
    }
}
