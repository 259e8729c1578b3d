//! On-disk trailer appended to a proxy executable.
//!
//! ```text
//! [ executable image ][ payload ][ length: u32 LE ][ "EXEC" ]
//! ```
//!
//! Decoding is always anchored at the true end of the image, so any bytes in
//! front of the final trailer (including an older trailer) are inert.

use crate::error::TrailerError;

pub const MAGIC: [u8; 4] = *b"EXEC";
pub const MAGIC_LEN: u64 = MAGIC.len() as u64;
pub const LENGTH_LEN: u64 = 4;
/// Length field plus magic tag.
pub const FOOTER_LEN: u64 = LENGTH_LEN + MAGIC_LEN;

/// Builds `payload || length || magic`.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>, TrailerError> {
    let length =
        u32::try_from(payload.len()).map_err(|_| TrailerError::PayloadTooLarge(payload.len()))?;

    let mut out = Vec::with_capacity(payload.len() + FOOTER_LEN as usize);
    out.extend_from_slice(payload);
    out.extend_from_slice(&length.to_le_bytes());
    out.extend_from_slice(&MAGIC);
    Ok(out)
}

/// Returns the payload stored at the end of `image`, or `None` when the image
/// does not end with the magic tag.
pub fn decode_tail(image: &[u8]) -> Result<Option<&[u8]>, TrailerError> {
    let image_len = image.len() as u64;
    if !has_magic(image) {
        return Ok(None);
    }
    if image_len < FOOTER_LEN {
        return Err(TrailerError::MissingLength { image_len });
    }

    let length_at = image.len() - FOOTER_LEN as usize;
    let mut length = [0u8; 4];
    length.copy_from_slice(&image[length_at..length_at + LENGTH_LEN as usize]);
    let length = u32::from_le_bytes(length);

    let start = payload_offset(image_len, length)? as usize;
    Ok(Some(&image[start..length_at]))
}

/// True when the last four bytes of `image` are the magic tag.
pub fn has_magic(image: &[u8]) -> bool {
    image.ends_with(&MAGIC)
}

/// Offset of the first payload byte for a trailer whose length field holds
/// `length`, checked against the image size.
pub fn payload_offset(image_len: u64, length: u32) -> Result<u64, TrailerError> {
    let available = image_len.saturating_sub(FOOTER_LEN);
    if u64::from(length) > available {
        return Err(TrailerError::LengthOutOfBounds { length, available });
    }
    Ok(available - u64::from(length))
}
