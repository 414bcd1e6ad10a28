//! `PollExecutor` - default `Executor` implementation.
//!
//! Readiness based: a submitted read is parked until `poll(2)` reports its
//! fd readable, then a single `read(2)` fills the caller's region and the
//! completion is queued as a task. Works on any kernel, needs no setup.

use inwatch_core::error::{Result, WatchError};
use inwatch_core::executor::{Executor, ReadCompletion, Scheduler, Task};
use inwatch_core::ktrace;

use crate::config::ExecutorConfig;
use crate::local_queue::LocalQueue;

use nix::errno::Errno;

use std::cell::RefCell;
use std::os::unix::io::RawFd;

struct PendingRead {
    fd: RawFd,
    buf: *mut u8,
    len: usize,
    done: ReadCompletion,
}

impl PendingRead {
    /// Issue the read and package the completion as a task.
    fn complete(self) -> Task {
        let result = loop {
            let ret = unsafe { libc::read(self.fd, self.buf as *mut libc::c_void, self.len) };
            if ret >= 0 {
                break Ok(ret as usize);
            }
            match Errno::last() {
                Errno::EINTR => continue,
                errno => break Err(WatchError::Os(errno)),
            }
        };
        ktrace!("poll: fd {} read -> {:?}", self.fd, result);
        let done = self.done;
        Box::new(move || done(result))
    }
}

pub struct PollExecutor {
    tasks: LocalQueue,
    reads: RefCell<Vec<PendingRead>>,
    config: ExecutorConfig,
}

impl PollExecutor {
    pub fn new(config: ExecutorConfig) -> Result<Self> {
        config.validate().map_err(|_| WatchError::ExecutorSetup(Errno::EINVAL))?;
        Ok(Self {
            tasks: LocalQueue::new(),
            reads: RefCell::new(Vec::new()),
            config,
        })
    }

    /// Reads submitted but not yet completed.
    pub fn inflight(&self) -> usize {
        self.reads.borrow().len()
    }

    /// Run tasks and wait for reads until nothing is outstanding.
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
            self.wait(self.config.poll_timeout_ms)?;
        }
    }

    /// Run exactly one task, waiting for I/O if none is queued.
    /// Returns `Ok(0)` only when there is nothing left to do.
    pub fn run_one(&self) -> Result<usize> {
        loop {
            if self.tasks.run_one() {
                return Ok(1);
            }
            if self.inflight() == 0 {
                return Ok(0);
            }
            self.wait(self.config.poll_timeout_ms)?;
        }
    }

    /// Run queued tasks and complete reads that are ready now, without
    /// blocking.
    pub fn run_ready(&self) -> Result<usize> {
        if self.inflight() > 0 {
            self.wait(0)?;
        }
        Ok(self.tasks.run_ready())
    }

    /// `poll(2)` every pending fd; turn ready reads into tasks.
    fn wait(&self, timeout_ms: i32) -> Result<usize> {
        let mut pending = std::mem::take(&mut *self.reads.borrow_mut());
        let mut pollfds: Vec<libc::pollfd> = pending
            .iter()
            .map(|r| libc::pollfd { fd: r.fd, events: libc::POLLIN, revents: 0 })
            .collect();

        let ready = loop {
            let ret = unsafe { libc::poll(pollfds.as_mut_ptr(), pollfds.len() as libc::nfds_t, timeout_ms) };
            if ret >= 0 {
                break ret as usize;
            }
            match Errno::last() {
                Errno::EINTR => continue,
                errno => {
                    self.reads.borrow_mut().append(&mut pending);
                    return Err(WatchError::Os(errno));
                }
            }
        };

        let mut still_waiting = Vec::with_capacity(pending.len());
        for (read, pfd) in pending.into_iter().zip(pollfds) {
            // POLLERR/POLLHUP/POLLNVAL: let read(2) report the error.
            if pfd.revents != 0 {
                self.tasks.schedule(read.complete());
            } else {
                still_waiting.push(read);
            }
        }
        self.reads.borrow_mut().append(&mut still_waiting);
        Ok(ready)
    }
}

impl Scheduler for PollExecutor {
    fn schedule(&self, task: Task) {
        self.tasks.schedule(task);
    }
}

impl Executor for PollExecutor {
    unsafe fn submit_read(&self, fd: RawFd, buf: *mut u8, len: usize, done: ReadCompletion) {
        // poll(2) silently skips negative fds; such a read would never complete.
        if fd < 0 {
            self.tasks.schedule(Box::new(move || done(Err(WatchError::Os(Errno::EBADF)))));
            return;
        }
        self.reads.borrow_mut().push(PendingRead { fd, buf, len, done });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn pipe() -> (RawFd, RawFd) {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) }, 0);
        (fds[0], fds[1])
    }

    fn close(fd: RawFd) {
        unsafe { libc::close(fd) };
    }

    #[test]
    fn test_read_completes_after_data() {
        let exec = PollExecutor::new(ExecutorConfig::default()).unwrap();
        let (r, w) = pipe();
        let mut buf = vec![0u8; 16];
        let got = Rc::new(Cell::new(None));
        let g = got.clone();
        unsafe {
            exec.submit_read(r, buf.as_mut_ptr(), buf.len(), Box::new(move |res| g.set(Some(res.unwrap()))));
        }
        assert_eq!(exec.inflight(), 1);
        assert_eq!(exec.run_ready().unwrap(), 0);
        assert!(got.get().is_none());

        assert_eq!(unsafe { libc::write(w, b"abc".as_ptr() as *const libc::c_void, 3) }, 3);
        exec.run().unwrap();
        assert_eq!(got.get(), Some(3));
        assert_eq!(&buf[..3], b"abc");
        close(r);
        close(w);
    }

    #[test]
    fn test_closed_writer_reads_zero() {
        let exec = PollExecutor::new(ExecutorConfig::default()).unwrap();
        let (r, w) = pipe();
        close(w);
        let mut buf = [0u8; 8];
        let got = Rc::new(Cell::new(None));
        let g = got.clone();
        unsafe {
            exec.submit_read(r, buf.as_mut_ptr(), buf.len(), Box::new(move |res| g.set(Some(res))));
        }
        assert_eq!(exec.run_one().unwrap(), 1);
        assert_eq!(got.take(), Some(Ok(0)));
        close(r);
    }

    #[test]
    fn test_bad_fd_reports_error() {
        let exec = PollExecutor::new(ExecutorConfig::default()).unwrap();
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
    fn test_invalid_config() {
        let config = ExecutorConfig::default().max_completions(0);
        assert!(PollExecutor::new(config).is_err());
    }
}
