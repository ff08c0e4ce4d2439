//
// error.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::fmt;

use nix::errno::Errno;

use crate::signals::FatalSignal;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// `sigaction()` refused to register the handler for this signal.
    InstallError { signal: FatalSignal, source: Errno },
    WatcherError(std::io::Error),
    InvalidDebuggerName(String),
    InvalidThreadName(String),
    ThreadNameError(Errno),
    ExePath(Errno),
    ExePathEmpty,
    ExePathTruncated { capacity: usize },
    PtracerError(Errno),
    ForkError(Errno),
    WaitError(Errno),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InstallError { source, .. } => Some(source),
            Error::WatcherError(source) => Some(source),
            Error::ExePath(source) |
            Error::ThreadNameError(source) |
            Error::PtracerError(source) |
            Error::ForkError(source) |
            Error::WaitError(source) => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InstallError { signal, source } => {
                write!(f, "Could not install signal handler for {signal}: {source}")
            },

            Error::WatcherError(source) => {
                write!(f, "Could not start the crash watcher thread: {source}")
            },

            Error::InvalidDebuggerName(name) => {
                write!(f, "Debugger name '{name}' contains a NUL byte")
            },

            Error::InvalidThreadName(name) => {
                write!(f, "Thread name '{name}' contains a NUL byte")
            },

            Error::ThreadNameError(source) => {
                write!(f, "Can't set thread name: {source}")
            },

            Error::ExePath(source) => {
                write!(f, "Can't read '/proc/self/exe': {source}")
            },

            Error::ExePathEmpty => {
                write!(f, "'/proc/self/exe' resolved to an empty path")
            },

            Error::ExePathTruncated { capacity } => {
                write!(f, "Executable path does not fit in {capacity} bytes")
            },

            Error::PtracerError(source) => {
                write!(f, "Can't allow the debugger to attach: {source}")
            },

            Error::ForkError(source) => {
                write!(f, "Can't fork the debugger process: {source}")
            },

            Error::WaitError(source) => {
                write!(f, "Lost track of the debugger process: {source}")
            },
        }
    }
}
