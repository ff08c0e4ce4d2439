//
// report.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::fmt;

use crate::signals::FatalSignal;
use crate::thread::ThreadIdentity;

const RULE: &str = "************************************************************************";
const BOLD_RED: &str = "\x1b[;1;31m";
const RESET: &str = "\x1b[;0m";

/// The report printed when a fatal signal comes in, ending with the
/// question whether to start the debugger.
pub struct Banner<'a> {
    pub signal: FatalSignal,
    pub thread: Option<&'a ThreadIdentity>,
    pub debugger: &'a str,
    pub color: bool,
}

impl fmt::Display for Banner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = if self.color { (BOLD_RED, RESET) } else { ("", "") };
        let signal = self.signal;
        let debugger = self.debugger;

        writeln!(f)?;
        writeln!(f, "{start}{RULE}")?;

        match self.thread {
            Some(thread) => writeln!(
                f,
                "Thread '{}' ({:#x}) received {signal} and crashed the program.",
                thread.name, thread.handle
            )?,
            None => writeln!(f, "The program received {signal} and crashed.")?,
        }

        writeln!(f, "Would you like to start {debugger} to inspect what happened (y/n)?")?;
        writeln!(f)?;
        writeln!(f, "Useful {debugger} commands:")?;
        writeln!(f, "  'info threads'      list all threads")?;
        writeln!(f, "  'thread <n>'        select thread <n>")?;
        writeln!(f, "  'bt [full]'         print the stack trace of the selected thread")?;
        writeln!(f)?;
        writeln!(
            f,
            "If the crash is not caused by your own code, please send us a bug report \
             including the full backtrace of the crashed thread."
        )?;
        writeln!(f, "{RULE}{end}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn main_thread() -> ThreadIdentity {
        ThreadIdentity {
            name: String::from("Main"),
            handle: 0x7f00_dead_beef,
        }
    }

    #[test]
    fn test_banner_names_signal_and_thread() {
        let thread = main_thread();
        let banner = Banner {
            signal: FatalSignal::Segv,
            thread: Some(&thread),
            debugger: "gdb",
            color: false,
        }
        .to_string();

        assert!(banner.contains("Thread 'Main' (0x7f00deadbeef) received SIGSEGV"));
        assert!(banner.contains("start gdb to inspect"));
        assert!(banner.contains("'info threads'"));
        assert!(banner.contains("'thread <n>'"));
        assert!(banner.contains("'bt [full]'"));
        assert!(!banner.contains('\x1b'));
    }

    #[test]
    fn test_banner_without_thread_identity() {
        let banner = Banner {
            signal: FatalSignal::Abort,
            thread: None,
            debugger: "lldb",
            color: false,
        }
        .to_string();

        assert!(banner.contains("The program received SIGABRT and crashed."));
        assert!(!banner.contains("Thread '"));
        assert!(banner.contains("Useful lldb commands:"));
    }

    #[test]
    fn test_banner_is_set_apart() {
        let thread = main_thread();
        let banner = Banner {
            signal: FatalSignal::Abort,
            thread: Some(&thread),
            debugger: "gdb",
            color: true,
        }
        .to_string();

        assert!(banner.starts_with(&format!("\n{BOLD_RED}{RULE}\n")));
        assert!(banner.ends_with(&format!("{RULE}{RESET}\n")));
        assert_eq!(banner.matches(RULE).count(), 2);
    }
}
