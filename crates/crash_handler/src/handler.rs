//
// handler.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use crate::context::CrashContext;
use crate::routine::Fault;
use crate::signals::FatalSignal;
use crate::thread::NativeThread;

/// Signal handler for SIGABRT and SIGSEGV.
///
/// Only the first fault of the process gets a report. Other threads that
/// crash in the meantime are held here until the report is done, without
/// printing anything. A second fault on the reporting thread itself returns
/// immediately.
pub(crate) extern "C" fn handle_crash(signum: libc::c_int) {
    let Some(context) = CrashContext::get() else {
        return;
    };
    let Some(signal) = FatalSignal::from_raw(signum) else {
        return;
    };

    let thread = NativeThread::current();

    if !context.guard.try_enter(thread.tid) {
        if context.guard.owner() == Some(thread.tid) {
            return;
        }
        let on_watcher = context
            .watcher
            .as_ref()
            .is_some_and(|watcher| watcher.is_watcher_thread(thread.tid));
        if on_watcher {
            // The watcher crashed while reporting. The report is lost, and
            // the owner would wait for it forever.
            unsafe {
                libc::signal(signum, libc::SIG_DFL);
                libc::raise(signum);
            }
            return;
        }

        // Returning now would let `abort()` take the whole process down
        // while the report is still on screen
        context.guard.wait_finished();
        return;
    }

    context.fault.record(Fault { signal, thread });

    let watcher = context
        .watcher
        .as_ref()
        .filter(|watcher| watcher.is_available_to(thread.tid));

    match watcher {
        Some(watcher) if watcher.notify() => watcher.wait(),
        _ => {
            // The watcher can't help, so do the work here and hope for the
            // best
            context.run_recorded();
        },
    }

    // We never recover. Restore the default disposition and queue the signal
    // again: it is blocked while we are in the handler and is delivered as
    // soon as we return, whether the original came from a faulting
    // instruction, `abort()`, or `kill()`.
    unsafe {
        libc::signal(signum, libc::SIG_DFL);
    }
    context.guard.finish();
    unsafe {
        libc::raise(signum);
    }
}
