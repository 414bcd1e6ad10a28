//! # inwatch-module - OS-backed implementations
//!
//! Everything in this crate touches the kernel. The session in `inwatch`
//! is written against the traits in `inwatch-core`; this crate supplies
//! the implementations it runs with by default.
//!
//! ## Default stack
//!
//! | Trait         | Default Impl   | Feature-gated alternative        |
//! |---------------|----------------|----------------------------------|
//! | EventSource   | InotifyFd      | any `read(2)`-like type          |
//! | Scheduler     | LocalQueue     | -                                |
//! | Executor      | PollExecutor   | UringExecutor (uring-default)    |
//!
//! Both executors share the same inherent driving API (`new`, `run`,
//! `run_one`, `run_ready`, `inflight`), so `DefaultExecutor` can be swapped
//! by feature without touching callers.

pub mod inotify_fd;
pub mod watch_item;
pub mod config;
pub mod local_queue;
pub mod poll_executor;
pub mod uring_executor;

pub use config::ExecutorConfig;
pub use inotify_fd::InotifyFd;
pub use local_queue::LocalQueue;
pub use poll_executor::PollExecutor;
pub use uring_executor::UringExecutor;
pub use watch_item::WatchHandle;

cfg_if::cfg_if! {
    if #[cfg(feature = "uring-default")] {
        pub type DefaultExecutor = UringExecutor;
    } else {
        pub type DefaultExecutor = PollExecutor;
    }
}
