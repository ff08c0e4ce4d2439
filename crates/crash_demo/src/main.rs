//
// main.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::sync::Arc;
use std::sync::Barrier;

use anyhow::anyhow;
use anyhow::Context;
use crash_handler::thread::NativeThread;
use crash_handler::CrashHandler;
use crash_handler::ThreadIdentity;

#[derive(Debug, Clone, Copy)]
enum Crash {
    Segv,
    Abort,
    Raise,
}

struct Options {
    crash: Crash,
    thread_name: Option<String>,
    spawn_thread: Option<String>,
    race: usize,
    anonymous: bool,
    color: Option<bool>,
}

fn print_usage() {
    println!("crash-demo {}, installs the crash handler and crashes.", env!("CARGO_PKG_VERSION"));
    println!(
        r#"
Usage: crash-demo <segv|abort|raise> [OPTIONS]

Crashes:
  segv                  Write through an invalid pointer
  abort                 Call abort()
  raise                 Send SIGSEGV to ourselves

Options:
  --name NAME           Name the crashing thread
  --in-thread NAME      Crash on a new thread called NAME
  --race N              Crash on N threads at once
  --anonymous           Don't tell the crash handler who crashed
  --color, --no-color   Force colours on or off
  --help                Print this help

The debugger can be chosen with the CRASH_HANDLER_DEBUGGER environment
variable, log verbosity with RUST_LOG.
"#
    );
}

fn parse_args() -> anyhow::Result<Option<Options>> {
    // Skip the first "argument" as it's the path/name to this executable
    let mut argv = std::env::args().skip(1);

    let mut crash = None;
    let mut thread_name = None;
    let mut spawn_thread = None;
    let mut race = 0;
    let mut anonymous = false;
    let mut color = None;

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "segv" => crash = Some(Crash::Segv),
            "abort" => crash = Some(Crash::Abort),
            "raise" => crash = Some(Crash::Raise),
            "--name" => {
                let name = argv.next().ok_or_else(|| anyhow!("--name requires a thread name"))?;
                thread_name = Some(name);
            },
            "--in-thread" => {
                let name = argv
                    .next()
                    .ok_or_else(|| anyhow!("--in-thread requires a thread name"))?;
                spawn_thread = Some(name);
            },
            "--race" => {
                let n = argv.next().ok_or_else(|| anyhow!("--race requires a count"))?;
                race = n
                    .parse()
                    .with_context(|| format!("Can't parse thread count '{n}'"))?;
            },
            "--anonymous" => anonymous = true,
            "--color" => color = Some(true),
            "--no-color" => color = Some(false),
            "--help" => {
                print_usage();
                return Ok(None);
            },
            other => return Err(anyhow!("Unknown argument '{other}'")),
        }
    }

    let Some(crash) = crash else {
        print_usage();
        return Err(anyhow!("No crash requested"));
    };

    Ok(Some(Options {
        crash,
        thread_name,
        spawn_thread,
        race,
        anonymous,
        color,
    }))
}

fn crash(kind: Crash) {
    match kind {
        // Low, aligned, never mapped
        Crash::Segv => unsafe { (8usize as *mut u64).write_volatile(0) },
        Crash::Abort => std::process::abort(),
        Crash::Raise => unsafe {
            libc::raise(libc::SIGSEGV);
        },
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Some(options) = parse_args()? else {
        return Ok(());
    };

    let mut handler = CrashHandler::new();
    if let Some(color) = options.color {
        handler = handler.color(color);
    }
    if options.anonymous {
        handler = handler.thread_resolver(|_: NativeThread| -> Option<ThreadIdentity> { None });
    }
    handler.install()?;

    let kind = options.crash;

    if options.race > 0 {
        let barrier = Arc::new(Barrier::new(options.race));
        let threads = (0..options.race)
            .map(|i| {
                let barrier = barrier.clone();
                std::thread::Builder::new()
                    .name(format!("racer-{i}"))
                    .spawn(move || {
                        barrier.wait();
                        crash(kind);
                    })
            })
            .collect::<Result<Vec<_>, std::io::Error>>()?;

        for thread in threads {
            let _ = thread.join();
        }
    } else if let Some(name) = options.spawn_thread {
        let thread = std::thread::Builder::new()
            .name(name)
            .spawn(move || crash(kind))?;
        let _ = thread.join();
    } else {
        if let Some(name) = &options.thread_name {
            crash_handler::set_current_thread_name(name)?;
        }
        crash(kind);
    }

    // Only reached if the process somehow survived its crash
    log::error!("Still alive after crashing");
    Err(anyhow!("Still alive after crashing"))
}
