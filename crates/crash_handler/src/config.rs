//
// config.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::ffi::CString;
use std::io::IsTerminal;

use crate::context::CrashContext;
use crate::context::CrashGuard;
use crate::context::FaultSlot;
use crate::debugger::ForkExecLauncher;
use crate::debugger::Launcher;
use crate::error::Error;
use crate::exe::resolve_exe_path;
use crate::routine::CrashRoutine;
use crate::signals::register_handlers;
use crate::thread::ProcfsThreadResolver;
use crate::thread::ThreadResolver;
use crate::watcher::Watcher;

/// Environment variable naming the debugger to start, looked up in `PATH`.
pub const DEBUGGER_ENV_VAR: &str = "CRASH_HANDLER_DEBUGGER";
pub const DEFAULT_DEBUGGER: &str = "gdb";

/// Configures and installs the crash handler.
///
/// ```no_run
/// crash_handler::CrashHandler::new()
///     .debugger("gdb")
///     .install()
///     .expect("crash handler");
/// ```
pub struct CrashHandler {
    debugger: String,
    color: bool,
    resolver: Box<dyn ThreadResolver>,
    launcher: Box<dyn Launcher>,
}

impl Default for CrashHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CrashHandler {
    pub fn new() -> Self {
        let debugger = std::env::var(DEBUGGER_ENV_VAR)
            .ok()
            .filter(|debugger| !debugger.is_empty())
            .unwrap_or_else(|| String::from(DEFAULT_DEBUGGER));

        let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();

        Self {
            debugger,
            color,
            resolver: Box::new(ProcfsThreadResolver),
            launcher: Box::new(ForkExecLauncher),
        }
    }

    pub fn debugger(mut self, debugger: impl Into<String>) -> Self {
        self.debugger = debugger.into();
        self
    }

    /// Highlight the crash report with ANSI colours.
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn thread_resolver(mut self, resolver: impl ThreadResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn launcher(mut self, launcher: impl Launcher + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Install the handler for SIGABRT and SIGSEGV.
    ///
    /// Can be called repeatedly, in which case the signal handlers are
    /// registered again but the configuration of the first successful call
    /// stays in effect.
    pub fn install(self) -> crate::Result<()> {
        if CrashContext::get().is_none() {
            self.initialize()?;
        } else {
            log::debug!("Crash handler already initialized, registering signal handlers again");
        }

        register_handlers()?;

        log::info!("Crash handler installed for SIGABRT and SIGSEGV");
        Ok(())
    }

    fn initialize(self) -> crate::Result<()> {
        let debugger = match CString::new(self.debugger) {
            Ok(debugger) => debugger,
            Err(err) => {
                let name = String::from_utf8_lossy(&err.into_vec()).into_owned();
                return Err(Error::InvalidDebuggerName(name));
            },
        };

        // Without the watcher, crashes are reported from the signal handler
        // directly
        let (watcher, remote) = match Watcher::new() {
            Ok((watcher, remote)) => (Some(watcher), Some(remote)),
            Err(err) => {
                log::warn!("{}", Error::WatcherError(err));
                (None, None)
            },
        };

        let routine = CrashRoutine {
            debugger,
            color: self.color,
            resolver: self.resolver,
            launcher: self.launcher,
            exe_path: resolve_exe_path,
        };

        let context = CrashContext {
            guard: CrashGuard::new(),
            fault: FaultSlot::default(),
            routine,
            watcher,
        };

        let (context, fresh) = CrashContext::publish(context);
        if !fresh {
            return Ok(());
        }

        log::trace!(
            "Crash handler will offer to start '{}'",
            context.routine.debugger.to_string_lossy()
        );

        if let (Some(watcher), Some(remote)) = (context.watcher.as_ref(), remote) {
            if let Err(err) = crate::watcher::spawn(context, watcher, remote) {
                log::warn!("{}", Error::WatcherError(err));
            }
        }

        Ok(())
    }
}
