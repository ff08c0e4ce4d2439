//
// prompt.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::io;
use std::io::Read;
use std::io::Write;
use std::os::fd::RawFd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

/// Read the operator's answer one byte at a time. Leading whitespace is
/// skipped, then `y` or `Y` means yes. Anything else, including end of input
/// and read errors, means no.
pub fn read_answer<R: Read + ?Sized>(input: &mut R) -> Answer {
    let mut byte = [0u8; 1];

    loop {
        match input.read(&mut byte) {
            Ok(0) => return Answer::No,
            Ok(_) if byte[0].is_ascii_whitespace() => continue,
            Ok(_) => break,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return Answer::No,
        }
    }

    match byte[0] {
        b'y' | b'Y' => Answer::Yes,
        _ => Answer::No,
    }
}

/// Unbuffered reader/writer over a raw file descriptor.
///
/// `std::io::stdin()` and `stdout()` go through process-wide locks that the
/// crashed thread may have held when it faulted. Going straight to
/// `read(2)`/`write(2)` sidesteps them.
#[derive(Debug, Clone, Copy)]
pub struct StdFd(RawFd);

impl StdFd {
    pub fn stdin() -> Self {
        Self(libc::STDIN_FILENO)
    }

    pub fn stdout() -> Self {
        Self(libc::STDOUT_FILENO)
    }
}

impl Read for StdFd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe { libc::read(self.0, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}

impl Write for StdFd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(self.0, buf.as_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
