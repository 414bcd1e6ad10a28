//! inwatch demo
//!
//! Watches one directory and prints every create, modify, delete and move
//! inside it.
//!
//! Usage:
//!     cargo build --release -p inwatch-watch
//!     ./target/release/inwatch-watch [sync|async] [dir] [count]
//!
//! `count` = 0 (default) runs until the watch goes away. Async mode uses
//! `DefaultExecutor` (`PollExecutor`, or `UringExecutor` when built with
//! `--features uring-default`).
//!
//! Try it:
//!     ./target/release/inwatch-watch async /tmp/demo 5 &
//!     touch /tmp/demo/a; mv /tmp/demo/a /tmp/demo/b; rm /tmp/demo/b

use inwatch::{
    kinfo, mask, AsyncWatcher, DefaultExecutor, Event, ExecutorConfig, Mask, Result, SessionConfig,
    WatchSession,
};

use std::cell::Cell;
use std::process::ExitCode;
use std::rc::Rc;

const WATCH_MASK: Mask = mask::CREATE | mask::MODIFY | mask::DELETE | mask::MOVE | mask::DELETE_SELF;

fn describe(bits: Mask) -> &'static str {
    const NAMES: [(Mask, &str); 7] = [
        (mask::CREATE, "created"),
        (mask::MODIFY, "modified"),
        (mask::DELETE, "deleted"),
        (mask::MOVED_FROM, "moved out"),
        (mask::MOVED_TO, "moved in"),
        (mask::DELETE_SELF, "removed (watched dir)"),
        (mask::IGNORED, "no longer watched"),
    ];
    NAMES
        .iter()
        .find(|(bit, _)| mask::contains(bits, *bit))
        .map(|(_, name)| *name)
        .unwrap_or("unhandled")
}

fn print_event(ev: &Event) {
    let kind = if ev.is(mask::ISDIR) { "directory" } else { "file" };
    let cookie = if ev.cookie() != 0 { format!(" (cookie {})", ev.cookie()) } else { String::new() };
    println!("[wd {}] {} {:?} {}{}", ev.wd(), kind, ev.name(), describe(ev.mask()), cookie);
}

fn run_sync(mut session: WatchSession, count: usize) -> Result<()> {
    let mut seen = 0;
    while count == 0 || seen < count {
        let ev = session.next_owned()?;
        print_event(&ev);
        seen += 1;
        if ev.is(mask::IGNORED) {
            break;
        }
    }
    Ok(())
}

type Watcher = AsyncWatcher<Rc<DefaultExecutor>>;

/// Print, then re-arm until `left` runs out or the watch is gone.
fn arm(w: Watcher, left: Rc<Cell<usize>>, failed: Rc<Cell<Option<inwatch::WatchError>>>) {
    let next = w.clone();
    w.watch_async(move |res| match res {
        Ok(ev) => {
            print_event(&ev);
            let remaining = left.get().saturating_sub(1);
            left.set(remaining);
            if remaining > 0 && !ev.is(mask::IGNORED) {
                arm(next, left, failed);
            }
        }
        Err(e) => failed.set(Some(e)),
    });
}

fn run_async(session: WatchSession, count: usize) -> Result<()> {
    let exec = Rc::new(DefaultExecutor::new(ExecutorConfig::from_env())?);
    let watcher = AsyncWatcher::new(session, Rc::clone(&exec));
    let left = Rc::new(Cell::new(if count == 0 { usize::MAX } else { count }));
    let failed = Rc::new(Cell::new(None));

    arm(watcher, left, Rc::clone(&failed));
    let tasks = exec.run()?;
    kinfo!("executor idle after {} tasks", tasks);
    match failed.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let mode = args.get(1).map(String::as_str).unwrap_or("sync");
    let dir = args.get(2).map(String::as_str).unwrap_or(".");
    let count: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0);

    let result = WatchSession::open(&SessionConfig::from_env()).and_then(|session| {
        let watch = session.add_watch(dir, WATCH_MASK)?;
        eprintln!("inwatch-watch: {} mode, watching {} (wd {})", mode, dir, watch.wd());
        let result = match mode {
            "async" => run_async(session, count),
            _ => run_sync(session, count),
        };
        drop(watch);
        result
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("inwatch-watch: {}", e);
            ExitCode::FAILURE
        }
    }
}
