//
// debugger.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::ffi::CStr;
use std::ffi::CString;

use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::waitpid;
use nix::sys::wait::WaitStatus;
use nix::unistd::fork;
use nix::unistd::ForkResult;

use crate::error::Error;

/// Allow descendants of this process to `ptrace()` it.
///
/// With Yama's `ptrace_scope = 1` (the default on most distributions) only
/// ancestors may attach, and the debugger we spawn is a child.
pub fn grant_ptracer() -> crate::Result<()> {
    let pid = nix::unistd::getpid().as_raw() as libc::c_ulong;

    let result = unsafe { libc::prctl(libc::PR_SET_PTRACER, pid, 0, 0, 0) };
    if result != 0 {
        return Err(Error::PtracerError(Errno::last()));
    }

    Ok(())
}

/// `<debugger> <binary> <pid>`, prepared up front so that nothing needs to
/// allocate between `fork()` and `execvp()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebuggerCommand {
    argv: Vec<CString>,
}

impl DebuggerCommand {
    pub fn new(program: &CStr, binary: &CStr, pid: u32) -> Self {
        let pid = CString::new(pid.to_string()).unwrap_or_default();
        Self {
            argv: vec![program.to_owned(), binary.to_owned(), pid],
        }
    }

    pub fn program(&self) -> &CStr {
        &self.argv[0]
    }

    pub fn argv(&self) -> &[CString] {
        &self.argv
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStatus {
    Exited(i32),
    Signaled(Signal),
    Other,
}

impl From<WaitStatus> for LaunchStatus {
    fn from(status: WaitStatus) -> Self {
        match status {
            WaitStatus::Exited(_, code) => LaunchStatus::Exited(code),
            WaitStatus::Signaled(_, signal, _) => LaunchStatus::Signaled(signal),
            _ => LaunchStatus::Other,
        }
    }
}

/// Runs the debugger and blocks until it is done.
pub trait Launcher: Send + Sync {
    fn launch(&self, command: &DebuggerCommand) -> crate::Result<LaunchStatus>;
}

/// Forks and `execvp()`s the debugger, looking it up in `PATH`.
#[derive(Debug, Default)]
pub struct ForkExecLauncher;

impl Launcher for ForkExecLauncher {
    fn launch(&self, command: &DebuggerCommand) -> crate::Result<LaunchStatus> {
        let mut argv: Vec<*const libc::c_char> =
            command.argv().iter().map(|arg| arg.as_ptr()).collect();
        argv.push(std::ptr::null());

        match unsafe { fork() }.map_err(Error::ForkError)? {
            ForkResult::Child => {
                unsafe { libc::execvp(command.program().as_ptr(), argv.as_ptr()) };

                // Could not start the debugger. The child must not return into
                // the crash routine, it would run a second copy of the
                // parent's remaining work. Not `abort()`: if the parent is
                // crashing inside `abort()` the child may have inherited its
                // lock.
                unsafe {
                    libc::signal(libc::SIGABRT, libc::SIG_DFL);
                    libc::raise(libc::SIGABRT);
                    libc::_exit(127);
                }
            },

            ForkResult::Parent { child } => loop {
                match waitpid(child, None) {
                    Ok(status) => return Ok(status.into()),
                    Err(Errno::EINTR) => continue,
                    Err(err) => return Err(Error::WaitError(err)),
                }
            },
        }
    }
}
