//
// invalid_debugger.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use assert_matches::assert_matches;
use crash_handler::CrashHandler;
use crash_handler::Error;

#[test]
fn test_debugger_name_with_nul_is_rejected() {
    let result = CrashHandler::new().debugger("g\0db").install();
    assert_matches!(result, Err(Error::InvalidDebuggerName(name)) => {
        assert_eq!(name, "g\0db");
    });

    // Nothing was registered
    let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
    assert_eq!(
        unsafe { libc::sigaction(libc::SIGABRT, std::ptr::null(), &mut action) },
        0
    );
    assert_eq!(action.sa_sigaction, libc::SIG_DFL);

    // A valid configuration still gets through afterwards
    assert!(CrashHandler::new().debugger("gdb").install().is_ok());
    assert_eq!(
        unsafe { libc::sigaction(libc::SIGABRT, std::ptr::null(), &mut action) },
        0
    );
    assert_ne!(action.sa_sigaction, libc::SIG_DFL);
}
