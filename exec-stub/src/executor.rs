use std::ffi::OsStr;
use std::process::{Command, ExitStatus};

use tracing::info;

use crate::error::{Error, Result};

/// Runs `command` through the host shell and waits for it to finish.
///
/// The returned value is the child's exit status. A child terminated by a
/// signal reports `128 + signal`, as the shell would.
pub fn execute(command: &OsStr) -> Result<i32> {
    info!(command = %command.to_string_lossy(), "running command");
    let status = shell(command).status().map_err(|source| Error::Execute {
        command: command.to_string_lossy().into_owned(),
        source,
    })?;
    Ok(exit_code(status))
}

#[cfg(unix)]
fn shell(command: &OsStr) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &OsStr) -> Command {
    use std::os::windows::process::CommandExt;

    let comspec = std::env::var_os("COMSPEC").unwrap_or_else(|| "cmd.exe".into());
    // With /S, cmd strips exactly the outer pair of quotes, leaving any
    // quoted words inside the command untouched.
    let mut wrapped = std::ffi::OsString::from("\"");
    wrapped.push(command);
    wrapped.push("\"");

    let mut cmd = Command::new(comspec);
    cmd.args(["/S", "/C"]).raw_arg(wrapped);
    cmd
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
