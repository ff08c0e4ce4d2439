//
// routine.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::ffi::CString;
use std::io::Read;
use std::io::Write;

use crate::debugger::grant_ptracer;
use crate::debugger::DebuggerCommand;
use crate::debugger::LaunchStatus;
use crate::debugger::Launcher;
use crate::exe::ExePath;
use crate::prompt::read_answer;
use crate::prompt::Answer;
use crate::report::Banner;
use crate::signals::FatalSignal;
use crate::thread::NativeThread;
use crate::thread::ThreadResolver;

/// What the handler captured at the moment of the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fault {
    pub(crate) signal: FatalSignal,
    pub(crate) thread: NativeThread,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Declined,
    DebuggerExited(LaunchStatus),
    DebuggerUnavailable,
}

/// Everything that happens between the fault and the process going down:
/// report, ask, and optionally run a debugger attached to ourselves.
pub(crate) struct CrashRoutine {
    pub(crate) debugger: CString,
    pub(crate) color: bool,
    pub(crate) resolver: Box<dyn ThreadResolver>,
    pub(crate) launcher: Box<dyn Launcher>,
    pub(crate) exe_path: fn() -> crate::Result<ExePath>,
}

impl CrashRoutine {
    pub(crate) fn run<R, W>(&self, fault: Fault, input: &mut R, output: &mut W) -> Outcome
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let debugger = self.debugger.to_string_lossy();
        let thread = self.resolver.resolve(fault.thread);

        let banner = Banner {
            signal: fault.signal,
            thread: thread.as_ref(),
            debugger: &debugger,
            color: self.color,
        };

        // Best effort from here on. If we can't even write to stdout there is
        // still the answer to wait for.
        let _ = write!(output, "{banner}");
        let _ = output.flush();

        if read_answer(input) == Answer::No {
            return Outcome::Declined;
        }

        // Without the grant the attach fails under a restrictive Yama policy,
        // but a permissive one doesn't need it so go ahead regardless.
        if let Err(err) = grant_ptracer() {
            let _ = writeln!(output, "{err}");
        }

        let pid = std::process::id();

        let binary = match (self.exe_path)() {
            Ok(binary) => binary,
            Err(err) => {
                let _ = writeln!(
                    output,
                    "Could not locate the running executable ({err}); not starting {debugger}."
                );
                return Outcome::DebuggerUnavailable;
            },
        };

        let command = DebuggerCommand::new(&self.debugger, binary.as_c_str(), pid);

        match self.launcher.launch(&command) {
            Ok(status) => {
                if let LaunchStatus::Signaled(signal) = status {
                    let _ = writeln!(output, "{debugger} ended abnormally ({signal}).");
                }
                Outcome::DebuggerExited(status)
            },
            Err(err) => {
                let _ = writeln!(output, "{err}");
                Outcome::DebuggerUnavailable
            },
        }
    }
}
