//! `AsyncWatcher` - completion-based delivery on top of a `WatchSession`.
//!
//! ```text
//!   watch_async(cb)
//!        │
//!        ├─ pending > 0 ──▶ DeliverBuffered ─ schedule ─▶ pop ─▶ cb(Ok)
//!        │
//!        └─ pending == 0 ─▶ AwaitRead ─ submit_read ─▶ completion
//!                                                      ├─ Err    ─▶ cb(Err)
//!                                                      ├─ Ok(0)  ─▶ cb(Err(EndOfStream))
//!                                                      └─ Ok(n)  ─▶ grow, pop ─▶ cb(Ok)
//! ```
//!
//! Exactly one request may be outstanding. The session returns to `Idle`
//! before the callback runs, so the callback may call `watch_async` again.
//! Nothing re-arms automatically.

use inwatch_core::error::Result;
use inwatch_core::event::Event;
use inwatch_core::executor::{Executor, ReadCompletion};
use inwatch_core::ktrace;

use crate::session::{State, WatchSession};

use inwatch_module::InotifyFd;

use std::cell::{Ref, RefCell};
use std::os::unix::io::AsRawFd;
use std::rc::Rc;

/// Shareable async front end. Clones share one session.
pub struct AsyncWatcher<E, S = InotifyFd, B = Box<[u8]>> {
    session: Rc<RefCell<WatchSession<S, B>>>,
    executor: E,
}

impl<E, S, B> AsyncWatcher<E, S, B>
where
    E: Executor,
    S: AsRawFd + 'static,
    B: AsRef<[u8]> + AsMut<[u8]> + 'static,
{
    pub fn new(session: WatchSession<S, B>, executor: E) -> Self {
        Self { session: Rc::new(RefCell::new(session)), executor }
    }

    /// Request the next event. `callback` runs exactly once, later, from
    /// the executor loop.
    ///
    /// # Panics
    /// Panics if a request is already outstanding.
    pub fn watch_async<F>(&self, callback: F)
    where
        F: FnOnce(Result<Event>) + 'static,
    {
        let mut session = self.session.borrow_mut();
        let fd = session.source().as_raw_fd();
        let region = session.begin_async();
        drop(session);

        // Each continuation holds the session, so the buffer outlives the
        // read even if every watcher is dropped first.
        let rc = Rc::clone(&self.session);
        match region {
            None => {
                ktrace!("watch_async: deliver buffered");
                self.executor.schedule(Box::new(move || {
                    let result = rc.borrow_mut().finish_buffered();
                    callback(result);
                }));
            }
            Some((buf, len)) => {
                ktrace!("watch_async: read fd {} into {} bytes", fd, len);
                let done: ReadCompletion = Box::new(move |res| {
                    let result = rc.borrow_mut().finish_read(res);
                    callback(result);
                });
                // Safety: the region belongs to heap storage kept alive by
                // `done`, and the session refuses buffer access until
                // `finish_read` returns it to Idle.
                unsafe { self.executor.submit_read(fd, buf, len, done) };
            }
        }
    }
}

impl<E, S, B> AsyncWatcher<E, S, B> {
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Read-only view of the session, or `None` while a request is
    /// outstanding: the free region then belongs to the executor.
    pub fn session(&self) -> Option<Ref<'_, WatchSession<S, B>>> {
        let session = self.session.borrow();
        (session.state() == State::Idle).then_some(session)
    }

    pub fn is_idle(&self) -> bool {
        self.session.borrow().state() == State::Idle
    }

    /// Recover the session once no request is outstanding and no other
    /// watcher shares it. Otherwise hands `self` back.
    pub fn into_session(self) -> std::result::Result<WatchSession<S, B>, Self> {
        if !self.is_idle() {
            return Err(self);
        }
        match Rc::try_unwrap(self.session) {
            Ok(cell) => Ok(cell.into_inner()),
            Err(session) => Err(Self { session, executor: self.executor }),
        }
    }
}

impl<E: Clone, S, B> Clone for AsyncWatcher<E, S, B> {
    fn clone(&self) -> Self {
        Self { session: Rc::clone(&self.session), executor: self.executor.clone() }
    }
}
