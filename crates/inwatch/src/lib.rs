//! # inwatch - inotify watch sessions
//!
//! Register watches on paths and consume the kernel's change events either
//! by blocking on [`WatchSession::next_event`] or by handing reads to an
//! executor with [`AsyncWatcher::watch_async`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use inwatch::{mask, SessionConfig, WatchSession};
//!
//! let mut session = WatchSession::open(&SessionConfig::default())?;
//! let _watch = session.add_watch("/tmp", mask::CREATE | mask::DELETE)?;
//! loop {
//!     let event = session.next_event()?;
//!     println!("{:?} {:?}", event.mask(), event.name());
//! }
//! ```
//!
//! Asynchronously, with the default executor:
//!
//! ```ignore
//! use inwatch::{AsyncWatcher, DefaultExecutor, ExecutorConfig};
//!
//! let exec = Rc::new(DefaultExecutor::new(ExecutorConfig::from_env())?);
//! let watcher = AsyncWatcher::new(session, Rc::clone(&exec));
//! watcher.watch_async(|res| println!("{:?}", res));
//! exec.run()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  inwatch: WatchSession (sync), AsyncWatcher (async)      │
//! └──────────────────────────────────────────────────────────┘
//!                │                           │
//!                ▼                           ▼
//! ┌──────────────────────────┐  ┌───────────────────────────┐
//! │ inwatch-core             │  │ inwatch-module            │
//! │ EventBuffer, Event,      │  │ InotifyFd, WatchHandle,   │
//! │ EventSource, Executor    │  │ PollExecutor,             │
//! │ traits, WatchError       │  │ UringExecutor             │
//! └──────────────────────────┘  └───────────────────────────┘
//! ```

pub mod config;
pub mod session;
pub mod watcher;

pub use config::SessionConfig;
pub use session::{State, WatchSession};
pub use watcher::AsyncWatcher;

pub use inwatch_core::{
    kdebug, kerror, kinfo, kprintln, ktrace, kwarn,
    mask, Event, EventBuffer, EventRef, EventSource, Executor, Result, Scheduler, WatchError,
    Cookie, Mask, WatchDescriptor, HEADER_SIZE, MIN_BUFFER_SIZE,
};
pub use inwatch_module::{
    DefaultExecutor, ExecutorConfig, InotifyFd, LocalQueue, PollExecutor, UringExecutor, WatchHandle,
};
