//! Executor abstraction for asynchronous delivery.
//!
//! The async watch path needs exactly two things from its environment:
//! a way to run a callback later ([`Scheduler`]) and a way to start a
//! non-blocking read that completes through a callback ([`Executor`]).
//!
//! # Implementors
//!
//! - `LocalQueue` (inwatch-module): FIFO task queue, no I/O.
//! - `PollExecutor` (default): `poll(2)` readiness, then `read(2)`.
//! - `UringExecutor` (feature = "uring-default"): `IORING_OP_READ` submissions,
//!   completions drained from the CQ.
//!
//! All of them are single-threaded: tasks and completions run on the
//! thread that drives the executor's `run()`.

use crate::error::Result;

use std::os::unix::io::RawFd;
use std::rc::Rc;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + 'static>;

/// Continuation for a read: byte count or a normalized error.
pub type ReadCompletion = Box<dyn FnOnce(Result<usize>) + 'static>;

/// Runs callbacks later, in FIFO order.
///
/// **Contract:** `schedule()` never runs `task` before it returns. Tasks
/// scheduled from inside a running task run on a later turn.
pub trait Scheduler {
    fn schedule(&self, task: Task);
}

/// A scheduler that can also drive non-blocking reads.
pub trait Executor: Scheduler {
    /// Start a read of up to `len` bytes from `fd` into `buf`.
    ///
    /// `done` runs exactly once, from the executor loop, never from inside
    /// this call. Submission failures are reported through `done` as well.
    ///
    /// # Safety
    /// `buf..buf + len` must stay valid, and must not be read or written by
    /// anyone else, until `done` has been called or the executor dropped.
    unsafe fn submit_read(&self, fd: RawFd, buf: *mut u8, len: usize, done: ReadCompletion);
}

impl<T: Scheduler + ?Sized> Scheduler for Rc<T> {
    fn schedule(&self, task: Task) {
        (**self).schedule(task)
    }
}

impl<T: Executor + ?Sized> Executor for Rc<T> {
    unsafe fn submit_read(&self, fd: RawFd, buf: *mut u8, len: usize, done: ReadCompletion) {
        (**self).submit_read(fd, buf, len, done)
    }
}

impl<T: Scheduler + ?Sized> Scheduler for &T {
    fn schedule(&self, task: Task) {
        (**self).schedule(task)
    }
}

impl<T: Executor + ?Sized> Executor for &T {
    unsafe fn submit_read(&self, fd: RawFd, buf: *mut u8, len: usize, done: ReadCompletion) {
        (**self).submit_read(fd, buf, len, done)
    }
}
