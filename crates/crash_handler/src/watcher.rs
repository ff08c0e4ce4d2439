//
// watcher.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

//! The crash watcher thread.
//!
//! Printing, prompting, and forking a debugger are not things to do from a
//! signal handler. The handler only records the fault and pokes this thread
//! through a socket, using nothing but `send(2)` and `read(2)`, then sleeps
//! in `read(2)` until the watcher is done with the report.

use std::io;
use std::io::Read;
use std::io::Write;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::Ordering;

use nix::errno::Errno;

use crate::context::CrashContext;
use crate::thread::current_tid;

pub(crate) const WATCHER_THREAD_NAME: &str = "crash-watcher";

/// The signal handler's end of the watcher socket.
pub(crate) struct Watcher {
    stream: UnixStream,

    /// Process the watcher thread belongs to. A child forked after
    /// installation inherits the socket but not the thread.
    pid: libc::pid_t,

    /// Kernel thread id of the watcher while it is running, 0 otherwise.
    tid: AtomicI32,
}

impl Watcher {
    /// Returns the handler side and the stream to hand over to `spawn()`.
    pub(crate) fn new() -> io::Result<(Self, UnixStream)> {
        let (stream, remote) = UnixStream::pair()?;
        let watcher = Self {
            stream,
            pid: nix::unistd::getpid().as_raw(),
            tid: AtomicI32::new(0),
        };
        Ok((watcher, remote))
    }

    /// Whether a fault on thread `tid` can be handed over. Not if the
    /// watcher isn't running yet, not if the watcher itself crashed, and
    /// not in a forked child, where the watcher thread doesn't exist.
    pub(crate) fn is_available_to(&self, tid: libc::pid_t) -> bool {
        self.is_available_in(nix::unistd::getpid().as_raw(), tid)
    }

    fn is_available_in(&self, pid: libc::pid_t, tid: libc::pid_t) -> bool {
        let watcher = self.tid.load(Ordering::Acquire);
        pid == self.pid && watcher != 0 && watcher != tid
    }

    pub(crate) fn is_watcher_thread(&self, tid: libc::pid_t) -> bool {
        tid != 0 &&
            nix::unistd::getpid().as_raw() == self.pid &&
            self.tid.load(Ordering::Acquire) == tid
    }

    /// Wake the watcher. Async-signal-safe.
    pub(crate) fn notify(&self) -> bool {
        let byte = [1u8];
        loop {
            let n = unsafe {
                libc::send(
                    self.stream.as_raw_fd(),
                    byte.as_ptr().cast(),
                    1,
                    libc::MSG_NOSIGNAL,
                )
            };
            match n {
                1 => return true,
                -1 if Errno::last() == Errno::EINTR => continue,
                _ => return false,
            }
        }
    }

    /// Block until the watcher reports back, or its end goes away.
    /// Async-signal-safe.
    pub(crate) fn wait(&self) {
        let mut byte = [0u8];
        loop {
            let n = unsafe { libc::read(self.stream.as_raw_fd(), byte.as_mut_ptr().cast(), 1) };
            if n == -1 && Errno::last() == Errno::EINTR {
                continue;
            }
            return;
        }
    }
}

pub(crate) fn spawn(
    context: &'static CrashContext,
    watcher: &'static Watcher,
    stream: UnixStream,
) -> io::Result<()> {
    std::thread::Builder::new()
        .name(String::from(WATCHER_THREAD_NAME))
        .spawn(move || watch(context, watcher, stream))?;
    Ok(())
}

fn watch(context: &'static CrashContext, watcher: &'static Watcher, mut stream: UnixStream) {
    watcher.tid.store(current_tid(), Ordering::Release);
    log::trace!("Crash watcher thread started");

    let mut byte = [0u8];
    loop {
        match stream.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                context.run_recorded();
                let _ = stream.write_all(&byte);
            },
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                log::error!("Crash watcher stopped: {err}");
                break;
            },
        }
    }

    watcher.tid.store(0, Ordering::Release);
}
