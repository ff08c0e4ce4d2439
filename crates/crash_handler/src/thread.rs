//
// thread.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::ffi::CString;

/// Raw identifiers of a thread, cheap enough to capture from a signal
/// handler (no allocation, no locks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeThread {
    /// Kernel thread id, as returned by `gettid()`.
    pub tid: libc::pid_t,

    /// `pthread_self()` of the thread. Only used for display.
    pub handle: u64,
}

impl NativeThread {
    pub fn current() -> Self {
        Self {
            tid: current_tid(),
            handle: unsafe { libc::pthread_self() } as u64,
        }
    }
}

pub(crate) fn current_tid() -> libc::pid_t {
    unsafe { libc::syscall(libc::SYS_gettid) as libc::pid_t }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadIdentity {
    pub name: String,
    pub handle: u64,
}

/// Maps the faulting thread to something a human can recognise.
///
/// This is called from the crash watcher thread after a fault, so
/// implementations should avoid taking locks that the crashed thread might
/// have been holding.
pub trait ThreadResolver: Send + Sync {
    fn resolve(&self, thread: NativeThread) -> Option<ThreadIdentity>;
}

impl<F> ThreadResolver for F
where
    F: Fn(NativeThread) -> Option<ThreadIdentity> + Send + Sync,
{
    fn resolve(&self, thread: NativeThread) -> Option<ThreadIdentity> {
        self(thread)
    }
}

/// Resolves thread names from `/proc/self/task/<tid>/comm`, which is where
/// both `std::thread::Builder::name()` and `set_current_thread_name()` end
/// up.
#[derive(Debug, Default)]
pub struct ProcfsThreadResolver;

impl ThreadResolver for ProcfsThreadResolver {
    fn resolve(&self, thread: NativeThread) -> Option<ThreadIdentity> {
        let path = format!("/proc/self/task/{}/comm", thread.tid);
        let comm = std::fs::read_to_string(path).ok()?;

        let name = comm.trim_end_matches('\n');
        if name.is_empty() {
            return None;
        }

        Some(ThreadIdentity {
            name: name.to_string(),
            handle: thread.handle,
        })
    }
}

/// Name the calling thread, e.g. to call the main thread `Main` in crash
/// reports. The kernel truncates names to 15 bytes.
pub fn set_current_thread_name(name: &str) -> crate::Result<()> {
    let name =
        CString::new(name).map_err(|_| crate::Error::InvalidThreadName(name.to_string()))?;

    let result = unsafe { libc::prctl(libc::PR_SET_NAME, name.as_ptr(), 0, 0, 0) };
    if result != 0 {
        return Err(crate::Error::ThreadNameError(nix::errno::Errno::last()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procfs_resolver_reads_thread_names() {
        let handle = std::thread::Builder::new()
            .name(String::from("resolver-test"))
            .spawn(|| {
                let thread = NativeThread::current();
                ProcfsThreadResolver.resolve(thread).map(|id| (id, thread))
            })
            .unwrap();

        let (identity, thread) = handle.join().unwrap().unwrap();
        assert_eq!(identity.name, "resolver-test");
        assert_eq!(identity.handle, thread.handle);
    }

    #[test]
    fn test_procfs_resolver_unknown_thread() {
        let thread = NativeThread {
            tid: libc::pid_t::MAX,
            handle: 1,
        };
        assert_eq!(ProcfsThreadResolver.resolve(thread), None);
    }

    #[test]
    fn test_closures_are_resolvers() {
        let resolver = |thread: NativeThread| {
            Some(ThreadIdentity {
                name: format!("tid-{}", thread.tid),
                handle: thread.handle,
            })
        };
        let thread = NativeThread { tid: 7, handle: 42 };
        let identity = resolver.resolve(thread).unwrap();
        assert_eq!(identity.name, "tid-7");
    }

    #[test]
    fn test_set_current_thread_name() {
        let handle = std::thread::spawn(|| {
            set_current_thread_name("Main").unwrap();
            ProcfsThreadResolver.resolve(NativeThread::current())
        });
        let identity = handle.join().unwrap().unwrap();
        assert_eq!(identity.name, "Main");
    }
}
