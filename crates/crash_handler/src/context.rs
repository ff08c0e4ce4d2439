//
// context.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::OnceLock;

use crate::prompt::StdFd;
use crate::routine::CrashRoutine;
use crate::routine::Fault;
use crate::routine::Outcome;
use crate::signals::FatalSignal;
use crate::thread::NativeThread;
use crate::watcher::Watcher;

static CONTEXT: OnceLock<CrashContext> = OnceLock::new();

/// One-shot flag: the first thread to call `try_enter()` owns the crash
/// report for the lifetime of the process.
#[derive(Debug, Default)]
pub(crate) struct CrashGuard {
    /// Kernel thread id of the owner, 0 while nobody entered.
    owner: AtomicI32,
    finished: AtomicBool,
}

impl CrashGuard {
    pub(crate) const fn new() -> Self {
        Self {
            owner: AtomicI32::new(0),
            finished: AtomicBool::new(false),
        }
    }

    /// Claim the guard for thread `tid` (non-zero). Succeeds exactly once.
    pub(crate) fn try_enter(&self, tid: libc::pid_t) -> bool {
        self.owner
            .compare_exchange(0, tid, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn owner(&self) -> Option<libc::pid_t> {
        match self.owner.load(Ordering::Acquire) {
            0 => None,
            tid => Some(tid),
        }
    }

    pub(crate) fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Sleep until the owner is done. Async-signal-safe.
    pub(crate) fn wait_finished(&self) {
        let pause = libc::timespec {
            tv_sec: 0,
            tv_nsec: 10_000_000,
        };
        while !self.is_finished() {
            unsafe { libc::nanosleep(&pause, std::ptr::null_mut()) };
        }
    }
}

/// Storage for the fault, written from the signal handler and read back on
/// the watcher thread. A signal number of 0 means nothing was recorded.
#[derive(Debug, Default)]
pub(crate) struct FaultSlot {
    signal: AtomicI32,
    tid: AtomicI32,
    handle: AtomicU64,
}

impl FaultSlot {
    pub(crate) fn record(&self, fault: Fault) {
        self.tid.store(fault.thread.tid, Ordering::Relaxed);
        self.handle.store(fault.thread.handle, Ordering::Relaxed);
        self.signal.store(fault.signal.as_raw(), Ordering::Release);
    }

    pub(crate) fn load(&self) -> Option<Fault> {
        let signal = FatalSignal::from_raw(self.signal.load(Ordering::Acquire))?;
        let thread = NativeThread {
            tid: self.tid.load(Ordering::Relaxed),
            handle: self.handle.load(Ordering::Relaxed),
        };
        Some(Fault { signal, thread })
    }
}

/// Process-wide state of the crash handler, created on installation and
/// never torn down.
pub(crate) struct CrashContext {
    pub(crate) guard: CrashGuard,
    pub(crate) fault: FaultSlot,
    pub(crate) routine: CrashRoutine,

    /// `None` if the watcher socket couldn't be created. Crashes are then
    /// reported from the signal handler itself.
    pub(crate) watcher: Option<Watcher>,
}

impl CrashContext {
    pub(crate) fn get() -> Option<&'static CrashContext> {
        CONTEXT.get()
    }

    /// Publish `context` unless another installation got there first.
    /// Returns the live context and whether it is the one passed in.
    pub(crate) fn publish(context: CrashContext) -> (&'static CrashContext, bool) {
        let mut fresh = false;
        let context = CONTEXT.get_or_init(|| {
            fresh = true;
            context
        });
        (context, fresh)
    }

    /// Run the crash routine for the recorded fault on the process's stdin
    /// and stdout.
    pub(crate) fn run_recorded(&self) -> Option<Outcome> {
        let fault = self.fault.load()?;
        Some(self.routine.run(fault, &mut StdFd::stdin(), &mut StdFd::stdout()))
    }
}
