use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use super::ReadFailure;
use crate::error::TrailerError;
use crate::trailer::{self, FOOTER_LEN, LENGTH_LEN, MAGIC, MAGIC_LEN};

/// Steps backwards from the end of the file: magic, then length, then payload.
pub(super) fn read(path: &Path) -> Result<Option<Vec<u8>>, ReadFailure> {
    let mut file = File::open(path)?;
    let image_len = file.seek(SeekFrom::End(0))?;
    if image_len < MAGIC_LEN {
        return Ok(None);
    }

    let mut magic = [0u8; MAGIC_LEN as usize];
    file.seek(SeekFrom::End(-(MAGIC_LEN as i64)))?;
    file.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Ok(None);
    }
    if image_len < FOOTER_LEN {
        return Err(TrailerError::MissingLength { image_len }.into());
    }

    let mut length = [0u8; LENGTH_LEN as usize];
    file.seek(SeekFrom::End(-(FOOTER_LEN as i64)))?;
    file.read_exact(&mut length)?;
    let length = u32::from_le_bytes(length);

    let start = trailer::payload_offset(image_len, length)?;
    debug!(image_len, length, start, "trailer located by seeking");

    let mut payload = vec![0u8; length as usize];
    file.seek(SeekFrom::Start(start))?;
    file.read_exact(&mut payload)?;
    Ok(Some(payload))
}
