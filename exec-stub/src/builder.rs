use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::command;
use crate::error::{Error, Result};
use crate::trailer;

/// Writes a proxy: a byte copy of `template` followed by a trailer holding
/// `assemble(None, tokens)`.
///
/// The proxy is write-once. If appending the trailer fails the output is left
/// as a partial file that the caller should delete.
pub fn build(template: &Path, output: &Path, tokens: &[OsString]) -> Result<()> {
    let payload = command::to_payload(command::assemble(None, tokens)).map_err(Error::Format)?;
    let encoded = trailer::encode(&payload).map_err(Error::Format)?;

    copy_template(template, output)?;

    let append = |source: io::Error| Error::Write {
        path: output.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new().append(true).open(output).map_err(append)?;
    if let Err(source) = file.write_all(&encoded).and_then(|()| file.sync_all()) {
        warn!(output = %output.display(), "trailer append failed, output is unusable");
        return Err(append(source));
    }

    info!(
        output = %output.display(),
        payload_len = payload.len(),
        "proxy written"
    );
    Ok(())
}

fn copy_template(template: &Path, output: &Path) -> Result<()> {
    let copy = |source: io::Error| Error::Copy {
        template: template.to_path_buf(),
        output: output.to_path_buf(),
        source,
    };

    // Copying a file onto itself truncates it.
    let template_canon = fs::canonicalize(template).map_err(copy)?;
    if fs::canonicalize(output).ok().as_ref() == Some(&template_canon) {
        return Err(copy(io::Error::new(
            io::ErrorKind::InvalidInput,
            "output path is the template itself",
        )));
    }

    fs::copy(template, output).map_err(copy)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(output).map_err(copy)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(output, perms).map_err(copy)?;
    }

    Ok(())
}
