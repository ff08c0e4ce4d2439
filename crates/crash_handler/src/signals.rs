//
// signals.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::fmt;
use std::io::Write;

use nix::sys::signal::sigaction;
use nix::sys::signal::SaFlags;
use nix::sys::signal::SigAction;
use nix::sys::signal::SigHandler;
use nix::sys::signal::SigSet;
use nix::sys::signal::Signal;

use crate::config::CrashHandler;
use crate::error::Error;
use crate::handler::handle_crash;

/// The fatal signals routed to the crash handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalSignal {
    Abort,
    Segv,
}

impl FatalSignal {
    /// Registration order.
    pub const ALL: [FatalSignal; 2] = [FatalSignal::Abort, FatalSignal::Segv];

    pub fn from_raw(signum: libc::c_int) -> Option<Self> {
        match signum {
            libc::SIGABRT => Some(FatalSignal::Abort),
            libc::SIGSEGV => Some(FatalSignal::Segv),
            _ => None,
        }
    }

    pub fn as_raw(self) -> libc::c_int {
        match self {
            FatalSignal::Abort => libc::SIGABRT,
            FatalSignal::Segv => libc::SIGSEGV,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FatalSignal::Abort => "SIGABRT",
            FatalSignal::Segv => "SIGSEGV",
        }
    }
}

impl fmt::Display for FatalSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<FatalSignal> for Signal {
    fn from(signal: FatalSignal) -> Self {
        match signal {
            FatalSignal::Abort => Signal::SIGABRT,
            FatalSignal::Segv => Signal::SIGSEGV,
        }
    }
}

/// Installs handlers for SIGABRT and SIGSEGV that report the crash and offer
/// to attach a debugger to the process.
///
/// Returns `true` if both handlers were installed. Failures are reported on
/// stderr; a handler installed before the failure is left in place.
pub fn install_crash_handler() -> bool {
    report_install(CrashHandler::new().install(), &mut std::io::stderr())
}

fn report_install<W: Write + ?Sized>(result: crate::Result<()>, stderr: &mut W) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            let _ = writeln!(stderr, "{err}");
            false
        },
    }
}

/// Point both fatal signals at the crash handler.
pub(crate) fn register_handlers() -> crate::Result<()> {
    register_with(|signal, action| unsafe { sigaction(signal, action) })
}

/// Stops at the first failure without restoring the previous disposition of
/// signals already registered.
fn register_with<F>(mut install: F) -> crate::Result<()>
where
    F: FnMut(Signal, &SigAction) -> nix::Result<SigAction>,
{
    // No extra signals blocked, no flags. In particular no `SA_RESETHAND`:
    // the handler restores the default disposition itself once the report
    // is done.
    let action = SigAction::new(
        SigHandler::Handler(handle_crash),
        SaFlags::empty(),
        SigSet::empty(),
    );

    for signal in FatalSignal::ALL {
        if let Err(source) = install(signal.into(), &action) {
            let err = Error::InstallError { signal, source };
            log::error!("{err}");
            return Err(err);
        }
        log::trace!("Crash handler registered for {signal}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use nix::errno::Errno;

    use super::*;

    #[test]
    fn test_fatal_signal_names() {
        assert_eq!(FatalSignal::Abort.to_string(), "SIGABRT");
        assert_eq!(FatalSignal::Segv.to_string(), "SIGSEGV");
    }

    #[test]
    fn test_fatal_signal_from_raw() {
        assert_eq!(FatalSignal::from_raw(libc::SIGSEGV), Some(FatalSignal::Segv));
        assert_eq!(FatalSignal::from_raw(libc::SIGABRT), Some(FatalSignal::Abort));
        assert_eq!(FatalSignal::from_raw(libc::SIGINT), None);
        assert_eq!(FatalSignal::from_raw(libc::SIGBUS), None);

        for signal in FatalSignal::ALL {
            assert_eq!(FatalSignal::from_raw(signal.as_raw()), Some(signal));
            assert_eq!(Signal::from(signal) as libc::c_int, signal.as_raw());
        }
    }

    #[test]
    fn test_registration_stops_at_first_failure() {
        let mut calls = Vec::new();
        let result = register_with(|signal, action| {
            calls.push(signal);
            match signal {
                Signal::SIGABRT => Ok(*action),
                _ => Err(Errno::EINVAL),
            }
        });

        assert_matches!(result, Err(Error::InstallError { signal, source }) => {
            assert_eq!(signal, FatalSignal::Segv);
            assert_eq!(source, Errno::EINVAL);
        });

        // SIGABRT is registered first and not rolled back
        assert_eq!(calls, vec![Signal::SIGABRT, Signal::SIGSEGV]);
    }

    #[test]
    fn test_registration_failure_on_first_signal() {
        let mut calls = Vec::new();
        let result = register_with(|signal, _| {
            calls.push(signal);
            Err(Errno::EPERM)
        });

        assert_matches!(result, Err(Error::InstallError { signal: FatalSignal::Abort, .. }));
        assert_eq!(calls, vec![Signal::SIGABRT]);
    }

    #[test]
    fn test_registered_action_has_no_flags_or_mask() {
        let mut actions = Vec::new();
        let result = register_with(|_, action| {
            actions.push(*action);
            Ok(*action)
        });

        assert!(result.is_ok());
        assert_eq!(actions.len(), 2);
        for action in actions {
            assert_eq!(action.flags(), SaFlags::empty());
            assert_eq!(action.mask(), SigSet::empty());
            assert_matches!(action.handler(), SigHandler::Handler(_));
        }
    }

    #[test]
    fn test_install_failure_is_reported_on_stderr() {
        let mut stderr = Vec::new();
        let err = Error::InstallError {
            signal: FatalSignal::Segv,
            source: Errno::EINVAL,
        };

        assert!(!report_install(Err(err), &mut stderr));
        assert_eq!(
            String::from_utf8(stderr).unwrap(),
            format!("Could not install signal handler for SIGSEGV: {}\n", Errno::EINVAL)
        );
    }

    #[test]
    fn test_install_success_is_silent() {
        let mut stderr = Vec::new();
        assert!(report_install(Ok(()), &mut stderr));
        assert!(stderr.is_empty());
    }
}
