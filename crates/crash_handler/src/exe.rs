//
// exe.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::ffi::CStr;
use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::errno::Errno;

use crate::error::Error;

pub const EXE_PATH_CAPACITY: usize = 1024;

/// Path of the running executable, stored inline so it can be resolved
/// without allocating after a crash.
pub struct ExePath {
    buf: [u8; EXE_PATH_CAPACITY],
    len: usize,
}

impl ExePath {
    pub fn as_c_str(&self) -> &CStr {
        // `len < EXE_PATH_CAPACITY` and `buf[len]` is the NUL we wrote. readlink
        // results never contain interior NULs.
        CStr::from_bytes_until_nul(&self.buf[..=self.len]).unwrap_or_default()
    }

    pub fn as_path(&self) -> &Path {
        Path::new(OsStr::from_bytes(&self.buf[..self.len]))
    }
}

impl std::fmt::Debug for ExePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ExePath").field(&self.as_path()).finish()
    }
}

/// Resolve `/proc/self/exe`.
pub fn resolve_exe_path() -> crate::Result<ExePath> {
    let mut buf = [0u8; EXE_PATH_CAPACITY];

    // Keep the last byte for the terminator
    let n = unsafe {
        libc::readlink(
            c"/proc/self/exe".as_ptr(),
            buf.as_mut_ptr().cast::<libc::c_char>(),
            EXE_PATH_CAPACITY - 1,
        )
    };

    let len = bounded_len(n, EXE_PATH_CAPACITY).map_err(|err| match err {
        Error::ExePath(_) => Error::ExePath(Errno::last()),
        err => err,
    })?;
    buf[len] = 0;

    Ok(ExePath { buf, len })
}

/// Validate the byte count returned by `readlink()` into a buffer of
/// `capacity` bytes, of which `capacity - 1` were offered to the call.
///
/// `readlink()` silently truncates, so a result that fills everything it was
/// offered is treated as truncated.
pub(crate) fn bounded_len(n: isize, capacity: usize) -> crate::Result<usize> {
    if n < 0 {
        return Err(Error::ExePath(Errno::UnknownErrno));
    }

    let n = n as usize;
    if n == 0 {
        return Err(Error::ExePathEmpty);
    }
    if n >= capacity.saturating_sub(1) {
        return Err(Error::ExePathTruncated { capacity });
    }

    Ok(n)
}
