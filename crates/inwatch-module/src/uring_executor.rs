//! `UringExecutor` - completion-based `Executor` on io_uring.
//!
//! Each `submit_read` becomes one `IORING_OP_READ` SQE whose `user_data`
//! is a slot index into the pending-completion slab. The run loop:
//!
//! ```text
//! loop {
//!     1. Run queued tasks (callbacks, finished reads)
//!     2. Nothing queued and nothing in flight → return
//!     3. submit_and_wait(1): kick queued SQEs, sleep for one CQE
//!     4. Drain CQ → take slot → schedule done(result) as a task
//! }
//! ```
//!
//! SQEs are only pushed by `submit_read`; the kernel sees them at the next
//! `submit_and_wait`, so a completion can never fire inside the submitting
//! call.

use inwatch_core::error::{Result, WatchError};
use inwatch_core::executor::{Executor, ReadCompletion, Scheduler, Task};
use inwatch_core::{kdebug, ktrace, kwarn};

use crate::config::ExecutorConfig;
use crate::local_queue::LocalQueue;

use io_uring::{opcode, types, IoUring};
use nix::errno::Errno;

use std::cell::{Cell, RefCell};
use std::os::unix::io::{AsRawFd, RawFd};

/// `user_data` of cancel SQEs issued on shutdown.
const CANCEL_TAG: u64 = u64::MAX - 1;

/// Pending completions indexed by `user_data`.
struct Slab {
    slots: Vec<Option<ReadCompletion>>,
    free: Vec<usize>,
}

impl Slab {
    fn new() -> Self {
        Self { slots: Vec::new(), free: Vec::new() }
    }

    fn insert(&mut self, done: ReadCompletion) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(done);
                idx
            }
            None => {
                self.slots.push(Some(done));
                self.slots.len() - 1
            }
        }
    }

    fn take(&mut self, idx: usize) -> Option<ReadCompletion> {
        let done = self.slots.get_mut(idx)?.take()?;
        self.free.push(idx);
        Some(done)
    }

    /// Leak every pending completion without running or dropping it.
    /// Returns how many were leaked.
    fn forget_all(&mut self) -> usize {
        let mut n = 0;
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if let Some(done) = slot.take() {
                std::mem::forget(done);
                self.free.push(idx);
                n += 1;
            }
        }
        n
    }

    fn occupied(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().enumerate().filter(|(_, s)| s.is_some()).map(|(i, _)| i)
    }
}

pub struct UringExecutor {
    // Dropped before `pending`: completions may own the read buffers.
    ring: RefCell<IoUring>,
    pending: RefCell<Slab>,
    tasks: LocalQueue,
    inflight: Cell<usize>,
    config: ExecutorConfig,
}

impl UringExecutor {
    pub fn new(config: ExecutorConfig) -> Result<Self> {
        config.validate().map_err(|_| WatchError::ExecutorSetup(Errno::EINVAL))?;
        let ring = IoUring::builder()
            .build(config.sq_entries)
            .map_err(|e| WatchError::ExecutorSetup(Errno::from_raw(e.raw_os_error().unwrap_or(libc::EIO))))?;
        kdebug!("io_uring executor: fd {} sq {}", ring.as_raw_fd(), config.sq_entries);
        Ok(Self {
            ring: RefCell::new(ring),
            pending: RefCell::new(Slab::new()),
            tasks: LocalQueue::new(),
            inflight: Cell::new(0),
            config,
        })
    }

    /// Reads submitted but not yet completed.
    pub fn inflight(&self) -> usize {
        self.inflight.get()
    }

    /// Run tasks and reap completions until nothing is outstanding.
    /// Returns the number of tasks run.
    pub fn run(&self) -> Result<usize> {
        let mut n = 0;
        loop {
            n += self.tasks.run_ready();
            if !self.tasks.is_empty() {
                continue;
            }
            if self.inflight() == 0 {
                return Ok(n);
            }
            self.reap(1)?;
        }
    }

    /// Run exactly one task, waiting for a completion if none is queued.
    /// Returns `Ok(0)` only when there is nothing left to do.
    pub fn run_one(&self) -> Result<usize> {
        loop {
            if self.tasks.run_one() {
                return Ok(1);
            }
            if self.inflight() == 0 {
                return Ok(0);
            }
            self.reap(1)?;
        }
    }

    /// Run queued tasks and any completions already posted, without
    /// blocking.
    pub fn run_ready(&self) -> Result<usize> {
        if self.inflight() > 0 {
            self.reap(0)?;
        }
        Ok(self.tasks.run_ready())
    }

    /// Submit queued SQEs, wait for `want` CQEs, and schedule their
    /// completions.
    fn reap(&self, want: usize) -> Result<usize> {
        let mut cqes = Vec::new();
        {
            let mut ring = self.ring.borrow_mut();
            loop {
                match ring.submit_and_wait(want) {
                    Ok(_) => break,
                    Err(e) if e.raw_os_error() == Some(libc::EINTR) => continue,
                    // CQ overflow backlog: drain what is there first.
                    Err(e) if e.raw_os_error() == Some(libc::EBUSY) => break,
                    Err(e) => return Err(e.into()),
                }
            }
            for cqe in ring.completion().take(self.config.max_completions) {
                cqes.push((cqe.user_data(), cqe.result()));
            }
        }

        let mut n = 0;
        for (user_data, res) in cqes {
            if user_data == CANCEL_TAG {
                continue;
            }
            let Some(done) = self.pending.borrow_mut().take(user_data as usize) else {
                kwarn!("io_uring: completion for unknown slot {}", user_data);
                continue;
            };
            self.inflight.set(self.inflight.get() - 1);
            let result = if res < 0 { Err(WatchError::from_neg_errno(res)) } else { Ok(res as usize) };
            ktrace!("io_uring: slot {} -> {:?}", user_data, result);
            self.tasks.schedule(Box::new(move || done(result)));
            n += 1;
        }
        Ok(n)
    }

    /// Cancel every in-flight read and wait for the kernel to let go of
    /// the buffers. Completions are dropped without being called.
    ///
    /// If the ring fails before every read has posted its CQE, the
    /// remaining completions are leaked: they own the read buffers, which
    /// the kernel may still write.
    pub fn shutdown(&self) {
        let ids: Vec<usize> = self.pending.borrow().occupied().collect();
        if ids.is_empty() {
            return;
        }
        kdebug!("io_uring executor: cancelling {} reads", ids.len());
        let mut ring = self.ring.borrow_mut();
        for id in ids {
            let sqe = opcode::AsyncCancel::new(id as u64).build().user_data(CANCEL_TAG);
            // Safety: cancel SQEs reference no user memory.
            while unsafe { ring.submission().push(&sqe) }.is_err() {
                if ring.submit().is_err() {
                    break;
                }
            }
        }
        // Each read posts exactly one CQE, cancelled or not.
        while self.inflight.get() > 0 {
            if let Err(e) = ring.submit_and_wait(1) {
                if e.raw_os_error() != Some(libc::EINTR) {
                    let leaked = self.pending.borrow_mut().forget_all();
                    self.inflight.set(0);
                    kwarn!("io_uring shutdown: {}; leaking {} read buffers", e, leaked);
                    break;
                }
            }
            for cqe in ring.completion() {
                if cqe.user_data() == CANCEL_TAG {
                    continue;
                }
                if self.pending.borrow_mut().take(cqe.user_data() as usize).is_some() {
                    self.inflight.set(self.inflight.get() - 1);
                }
            }
        }
    }
}

impl Drop for UringExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Scheduler for UringExecutor {
    fn schedule(&self, task: Task) {
        self.tasks.schedule(task);
    }
}

impl Executor for UringExecutor {
    unsafe fn submit_read(&self, fd: RawFd, buf: *mut u8, len: usize, done: ReadCompletion) {
        let len = len.min(u32::MAX as usize) as u32;
        let slot = self.pending.borrow_mut().insert(done);
        let sqe = opcode::Read::new(types::Fd(fd), buf, len)
            .offset(u64::MAX) // -1 = current position; inotify fds are not seekable
            .build()
            .user_data(slot as u64);

        // Safety: the caller keeps `buf` valid until `done` runs or the
        // executor is shut down.
        let mut ring = self.ring.borrow_mut();
        let mut pushed = unsafe { ring.submission().push(&sqe) }.is_ok();
        if !pushed && ring.submit().is_ok() {
            pushed = unsafe { ring.submission().push(&sqe) }.is_ok();
        }
        drop(ring);

        if pushed {
            self.inflight.set(self.inflight.get() + 1);
        } else if let Some(done) = self.pending.borrow_mut().take(slot) {
            self.tasks.schedule(Box::new(move || done(Err(WatchError::RingFull))));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    /// io_uring is often blocked by container seccomp profiles.
    fn executor() -> Option<UringExecutor> {
        match UringExecutor::new(ExecutorConfig::default()) {
            Ok(e) => Some(e),
            Err(e) => {
                kwarn!("skipping io_uring test: {}", e);
                None
            }
        }
    }

    fn pipe() -> (RawFd, RawFd) {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) }, 0);
        (fds[0], fds[1])
    }

    #[test]
    fn test_slab_reuses_slots() {
        let mut slab = Slab::new();
        let a = slab.insert(Box::new(|_| {}));
        let b = slab.insert(Box::new(|_| {}));
        assert_ne!(a, b);
        assert!(slab.take(a).is_some());
        assert!(slab.take(a).is_none());
        assert_eq!(slab.insert(Box::new(|_| {})), a);
        assert_eq!(slab.occupied().count(), 2);
    }

    #[test]
    fn test_forget_all_keeps_captures_alive() {
        let owner = Rc::new(());
        let mut slab = Slab::new();
        for _ in 0..2 {
            let held = Rc::clone(&owner);
            slab.insert(Box::new(move |_| drop(held)));
        }
        assert_eq!(Rc::strong_count(&owner), 3);
        assert_eq!(slab.forget_all(), 2);
        drop(slab);
        // Neither completion was dropped, so their clones are never released.
        assert_eq!(Rc::strong_count(&owner), 3);
    }

    #[test]
    fn test_read_pipe() {
        let Some(exec) = executor() else { return };
        let (r, w) = pipe();
        let mut buf = vec![0u8; 32];
        let got = Rc::new(Cell::new(None));
        let g = got.clone();
        unsafe {
            exec.submit_read(r, buf.as_mut_ptr(), buf.len(), Box::new(move |res| g.set(Some(res))));
        }
        assert_eq!(exec.inflight(), 1);
        assert_eq!(unsafe { libc::write(w, b"hello".as_ptr() as *const libc::c_void, 5) }, 5);
        exec.run().unwrap();
        assert_eq!(got.take(), Some(Ok(5)));
        assert_eq!(&buf[..5], b"hello");
        unsafe {
            libc::close(r);
            libc::close(w);
        }
    }

    #[test]
    fn test_bad_fd_error() {
        let Some(exec) = executor() else { return };
        let mut buf = [0u8; 8];
        let got = Rc::new(Cell::new(None));
        let g = got.clone();
        unsafe {
            exec.submit_read(-1, buf.as_mut_ptr(), buf.len(), Box::new(move |res| g.set(Some(res))));
        }
        exec.run().unwrap();
        assert_eq!(got.take(), Some(Err(WatchError::Os(Errno::EBADF))));
    }

    #[test]
    fn test_drop_with_read_in_flight() {
        let Some(exec) = executor() else { return };
        let (r, w) = pipe();
        let mut buf = vec![0u8; 8];
        let called = Rc::new(Cell::new(false));
        let c = called.clone();
        unsafe {
            exec.submit_read(r, buf.as_mut_ptr(), buf.len(), Box::new(move |_| c.set(true)));
        }
        // Kick the SQE to the kernel without waiting.
        exec.run_ready().unwrap();
        drop(exec);
        assert!(!called.get());
        unsafe {
            libc::close(r);
            libc::close(w);
        }
    }
}
