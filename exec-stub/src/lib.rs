//! Self-wrapping launcher.
//!
//! A plain `exec-stub` binary is a *template*: run with `-o <path> -c <cmd...>`
//! it writes a copy of itself with the command appended as a trailer. That copy
//! is a *proxy*: when run, it finds the trailer at the end of its own file,
//! appends its arguments to the stored command and hands the result to the
//! host shell.

pub mod builder;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod launcher;
pub mod locate;
pub mod logging;
pub mod reader;
pub mod trailer;

pub use error::{Error, Result, TrailerError, UsageError};
pub use launcher::{BuildRequest, Launcher, Mode, Outcome};
