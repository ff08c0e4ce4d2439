//
// lib.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

//! Crash handler for SIGABRT and SIGSEGV.
//!
//! When the process crashes, the handler prints which thread crashed and
//! asks on stdin whether to start a debugger. If the answer is `y`, the
//! debugger (`gdb` by default) is started on the running process and the
//! process waits for it to exit. The process then terminates with the
//! original signal.

pub mod config;
mod context;
pub mod debugger;
pub mod error;
pub mod exe;
mod handler;
pub mod prompt;
pub mod report;
mod routine;
pub mod signals;
pub mod thread;
mod watcher;

pub use crate::config::CrashHandler;
pub use crate::error::Error;
pub use crate::error::Result;
pub use crate::signals::install_crash_handler;
pub use crate::signals::FatalSignal;
pub use crate::thread::set_current_thread_name;
pub use crate::thread::ThreadIdentity;
pub use crate::thread::ThreadResolver;
