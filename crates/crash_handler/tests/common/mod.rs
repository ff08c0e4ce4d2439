//
// mod.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::fs::File;
use std::io::Read;
use std::os::fd::FromRawFd;

/// How a forked child ended, and what it printed on stdout.
pub struct ChildCrash {
    pub signal: Option<libc::c_int>,
    pub stdout: String,
}

/// Forks, raises `signum` in the child with stdin on `/dev/null` and stdout
/// on a pipe, and collects the result in the parent.
pub fn crash_in_child(signum: libc::c_int) -> ChildCrash {
    let mut fds = [0; 2];
    assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
    let [read_fd, write_fd] = fds;

    let pid = unsafe { libc::fork() };
    assert!(pid >= 0);

    if pid == 0 {
        unsafe {
            let null = libc::open(c"/dev/null".as_ptr(), libc::O_RDONLY);
            libc::dup2(null, libc::STDIN_FILENO);
            libc::dup2(write_fd, libc::STDOUT_FILENO);
            libc::close(read_fd);
            libc::raise(signum);
            libc::_exit(0);
        }
    }

    unsafe { libc::close(write_fd) };

    let mut stdout = String::new();
    let mut pipe = unsafe { File::from_raw_fd(read_fd) };
    pipe.read_to_string(&mut stdout).unwrap();

    let mut status = 0;
    assert_eq!(unsafe { libc::waitpid(pid, &mut status, 0) }, pid);

    let signal = if libc::WIFSIGNALED(status) {
        Some(libc::WTERMSIG(status))
    } else {
        None
    };

    ChildCrash { signal, stdout }
}
