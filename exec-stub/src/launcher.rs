//! Dual-mode entry point.
//!
//! ```text
//! START ── trailer found ──▶ PROXY ──▶ END (child's status)
//!   │
//!   └──── no trailer ─────▶ BUILD ──▶ END (0, or the error's status)
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::builder;
use crate::command;
use crate::config::Config;
use crate::error::{Result, UsageError};
use crate::executor;
use crate::locate;
use crate::reader::{self, StrategyChoice};

/// What the image at hand is, decided once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// The image carries a trailer; run its payload.
    Proxy { payload: Vec<u8> },
    /// Plain template; build a proxy from the command line.
    Build,
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Executed(i32),
    Built(PathBuf),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Executed(code) => *code,
            Outcome::Built(_) => 0,
        }
    }
}

/// Arguments accepted in build mode: `-o <path>` followed by `-c <tokens...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub output: PathBuf,
    pub tokens: Vec<OsString>,
}

impl BuildRequest {
    /// Scans `args` (program name excluded). The last `-o` before `-c` wins,
    /// everything after `-c` is the command, and other tokens before `-c`
    /// are ignored.
    pub fn parse(args: &[OsString]) -> Result<Self, UsageError> {
        let mut output: Option<PathBuf> = None;
        let mut pos = 0;

        while pos < args.len() {
            if args[pos] == "-o" {
                let value = args.get(pos + 1).ok_or(UsageError::MissingOutputValue)?;
                output = Some(PathBuf::from(value));
                pos += 2;
            } else if args[pos] == "-c" {
                let output = output
                    .filter(|path| !path.as_os_str().is_empty())
                    .ok_or(UsageError::MissingOutput)?;
                return Ok(Self {
                    output,
                    tokens: args[pos + 1..].to_vec(),
                });
            } else {
                pos += 1;
            }
        }

        Err(UsageError::MissingCommand)
    }
}

pub struct Launcher {
    image: PathBuf,
    reader: StrategyChoice,
}

impl Launcher {
    pub fn new(image: impl Into<PathBuf>, reader: StrategyChoice) -> Self {
        Self {
            image: image.into(),
            reader,
        }
    }

    /// Launcher for the running executable.
    pub fn current(config: &Config) -> Result<Self> {
        Ok(Self::new(locate::current_executable_path()?, config.reader))
    }

    pub fn detect(&self) -> Result<Mode> {
        let mode = match reader::read_trailer_with(&self.image, self.reader)? {
            Some(payload) => Mode::Proxy { payload },
            None => Mode::Build,
        };
        debug!(image = %self.image.display(), ?mode, "mode detected");
        Ok(mode)
    }

    /// Runs one invocation. `args` excludes the program name.
    pub fn run(&self, args: &[OsString]) -> Result<Outcome> {
        match self.detect()? {
            Mode::Proxy { payload } => run_proxy(payload, args).map(Outcome::Executed),
            Mode::Build => run_build(&self.image, args).map(Outcome::Built),
        }
    }
}

/// Appends `args` to the embedded command and runs it.
pub fn run_proxy(payload: Vec<u8>, args: &[OsString]) -> Result<i32> {
    let base = command::from_payload(payload);
    let command = command::assemble(Some(base.as_os_str()), args);
    executor::execute(&command)
}

/// Parses build flags and writes a proxy built from `template`.
pub fn run_build(template: &Path, args: &[OsString]) -> Result<PathBuf> {
    let request = BuildRequest::parse(args)?;
    builder::build(template, &request.output, &request.tokens)?;
    Ok(request.output)
}

/// Entry point used by the binary: locate self, then run.
pub fn launch(config: &Config, args: &[OsString]) -> Result<Outcome> {
    Launcher::current(config)?.run(args)
}
