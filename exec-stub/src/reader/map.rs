use std::fs::File;
use std::io;
use std::path::Path;

use tracing::debug;

use super::ReadFailure;
use crate::trailer::{self, MAGIC_LEN};

/// Maps the whole image read-only and decodes the trailer from the mapped end.
///
/// The payload is copied out before the mapping guard drops, so nothing
/// returned borrows from the mapping.
pub(super) fn read(path: &Path) -> Result<Option<Vec<u8>>, ReadFailure> {
    let file = File::open(path)?;
    let image_len = file.metadata()?.len();
    // Zero-length mappings are rejected by the OS; short files cannot hold a tag.
    if image_len < MAGIC_LEN {
        return Ok(None);
    }
    let len = usize::try_from(image_len)
        .map_err(|_| io::Error::other("image does not fit in the address space"))?;

    let mapping = platform::Mapping::new(&file, len)?;
    debug!(image_len, "image mapped");
    let payload = trailer::decode_tail(mapping.as_slice())?.map(<[u8]>::to_vec);
    Ok(payload)
}

#[cfg(unix)]
mod platform {
    use std::ffi::c_void;
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;
    use std::ptr::{self, NonNull};

    pub(super) struct Mapping {
        addr: NonNull<c_void>,
        len: usize,
    }

    impl Mapping {
        pub(super) fn new(file: &File, len: usize) -> io::Result<Self> {
            let addr = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    len,
                    libc::PROT_READ,
                    libc::MAP_PRIVATE,
                    file.as_raw_fd(),
                    0,
                )
            };
            if addr == libc::MAP_FAILED {
                return Err(io::Error::last_os_error());
            }
            let addr = NonNull::new(addr).ok_or_else(|| io::Error::other("mmap returned null"))?;
            Ok(Self { addr, len })
        }

        pub(super) fn as_slice(&self) -> &[u8] {
            // SAFETY: the region is mapped readable for `len` bytes until drop.
            unsafe { std::slice::from_raw_parts(self.addr.as_ptr().cast::<u8>(), self.len) }
        }
    }

    impl Drop for Mapping {
        fn drop(&mut self) {
            unsafe {
                libc::munmap(self.addr.as_ptr(), self.len);
            }
        }
    }
}

#[cfg(windows)]
mod platform {
    use std::fs::File;
    use std::io;
    use std::os::windows::io::AsRawHandle;
    use std::ptr;

    use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};
    use windows_sys::Win32::System::Memory::{
        CreateFileMappingW, MapViewOfFile, UnmapViewOfFile, FILE_MAP_READ,
        MEMORY_MAPPED_VIEW_ADDRESS, PAGE_READONLY,
    };

    struct MappingHandle(HANDLE);

    impl Drop for MappingHandle {
        fn drop(&mut self) {
            unsafe {
                CloseHandle(self.0);
            }
        }
    }

    /// The view is unmapped in `drop`, then the mapping handle field closes.
    pub(super) struct Mapping {
        view: MEMORY_MAPPED_VIEW_ADDRESS,
        len: usize,
        _handle: MappingHandle,
    }

    impl Mapping {
        pub(super) fn new(file: &File, len: usize) -> io::Result<Self> {
            let raw = unsafe {
                CreateFileMappingW(
                    file.as_raw_handle() as HANDLE,
                    ptr::null(),
                    PAGE_READONLY,
                    0,
                    0,
                    ptr::null(),
                )
            };
            if raw.is_null() {
                return Err(io::Error::last_os_error());
            }
            let handle = MappingHandle(raw);

            let view = unsafe { MapViewOfFile(handle.0, FILE_MAP_READ, 0, 0, len) };
            if view.Value.is_null() {
                return Err(io::Error::last_os_error());
            }
            Ok(Self {
                view,
                len,
                _handle: handle,
            })
        }

        pub(super) fn as_slice(&self) -> &[u8] {
            // SAFETY: the view covers `len` readable bytes until drop.
            unsafe { std::slice::from_raw_parts(self.view.Value.cast::<u8>(), self.len) }
        }
    }

    impl Drop for Mapping {
        fn drop(&mut self) {
            unsafe {
                UnmapViewOfFile(self.view);
            }
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod platform {
    use std::fs::File;
    use std::io::{self, Read};

    /// No mapping primitive here; hold the image in memory instead.
    pub(super) struct Mapping {
        bytes: Vec<u8>,
    }

    impl Mapping {
        pub(super) fn new(file: &File, len: usize) -> io::Result<Self> {
            let mut bytes = Vec::with_capacity(len);
            let mut file = file;
            file.read_to_end(&mut bytes)?;
            Ok(Self { bytes })
        }

        pub(super) fn as_slice(&self) -> &[u8] {
            &self.bytes
        }
    }
}
