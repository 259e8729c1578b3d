use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Absolute path of the binary that is currently running.
///
/// Both the builder (which copies this file) and the trailer reader (which
/// inspects it) depend on the answer, so a failure is reported rather than
/// guessed around.
pub fn current_executable_path() -> Result<PathBuf> {
    let path = env::current_exe().map_err(Error::Environment)?;
    if path.is_absolute() {
        return Ok(path);
    }
    fs::canonicalize(&path).map_err(Error::Environment)
}
