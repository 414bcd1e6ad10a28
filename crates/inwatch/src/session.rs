//! `WatchSession` - one event source plus one event buffer.
//!
//! The synchronous path lives here. The completion-based path is built on
//! the same state in [`crate::watcher::AsyncWatcher`].
//!
//! A refill happens only when every buffered record has been handed out:
//! the buffer is reset and exactly one read fills it from the start.

use inwatch_core::buffer::EventBuffer;
use inwatch_core::error::{Result, WatchError};
use inwatch_core::event::{Event, EventRef};
use inwatch_core::record::{Mask, WatchDescriptor};
use inwatch_core::source::EventSource;
use inwatch_core::ktrace;

use inwatch_module::{InotifyFd, WatchHandle};

use crate::config::SessionConfig;

use nix::errno::Errno;

use std::path::Path;

/// Outstanding async request, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    /// A buffered record is queued for delivery on the scheduler.
    DeliverBuffered,
    /// A read into the free region is in flight.
    AwaitRead,
}

pub struct WatchSession<S = InotifyFd, B = Box<[u8]>> {
    source: S,
    buffer: EventBuffer<B>,
    state: State,
}

impl WatchSession {
    /// Open a fresh inotify instance with a buffer sized by `config`.
    pub fn open(config: &SessionConfig) -> Result<Self> {
        config.validate().map_err(|_| WatchError::Os(Errno::EINVAL))?;
        let source = InotifyFd::new()?;
        Ok(Self::new(source, EventBuffer::with_capacity(config.buffer_capacity())))
    }
}

impl<B> WatchSession<InotifyFd, B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    pub fn add_watch(&self, path: impl AsRef<Path>, mask: Mask) -> Result<WatchHandle> {
        self.source.add_watch(path, mask)
    }

    pub fn rm_watch(&self, wd: WatchDescriptor) -> Result<()> {
        self.source.rm_watch(wd)
    }
}

impl<S, B> WatchSession<S, B> {
    pub fn state(&self) -> State {
        self.state
    }
}

impl<S, B> WatchSession<S, B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Bind `source` to `buffer`. The buffer should hold at least
    /// `MIN_BUFFER_SIZE` bytes or the kernel rejects reads with `EINVAL`.
    pub fn new(source: S, buffer: EventBuffer<B>) -> Self {
        Self { source, buffer, state: State::Idle }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn buffer(&self) -> &EventBuffer<B> {
        &self.buffer
    }

    /// Direct buffer access, e.g. to inject synthetic records.
    ///
    /// # Panics
    /// Panics while an async request is outstanding.
    pub fn buffer_mut(&mut self) -> &mut EventBuffer<B> {
        self.assert_idle("buffer_mut");
        &mut self.buffer
    }

    pub fn into_parts(self) -> (S, EventBuffer<B>) {
        self.assert_idle("into_parts");
        (self.source, self.buffer)
    }

    fn assert_idle(&self, op: &str) {
        assert!(
            self.state == State::Idle,
            "WatchSession::{} while {:?} is outstanding",
            op,
            self.state
        );
    }

    /// Start an async request: decide between delivering a buffered record
    /// and reading. Returns the free region for the read when one is needed.
    pub(crate) fn begin_async(&mut self) -> Option<(*mut u8, usize)> {
        assert!(
            self.state == State::Idle,
            "watch_async called while {:?} is outstanding",
            self.state
        );
        if self.buffer.pending_size() > 0 {
            self.state = State::DeliverBuffered;
            return None;
        }
        self.buffer.reset();
        self.state = State::AwaitRead;
        Some(self.buffer.free_region_ptr())
    }

    /// Deliver the next buffered record and return to `Idle`.
    pub(crate) fn finish_buffered(&mut self) -> Result<Event> {
        debug_assert_eq!(self.state, State::DeliverBuffered);
        self.state = State::Idle;
        let event = self.buffer.pop().map(Event::from);
        ktrace!("deliver buffered: {:?}", event);
        event
    }

    /// Account for a completed read, deliver its first record and return
    /// to `Idle`.
    pub(crate) fn finish_read(&mut self, res: Result<usize>) -> Result<Event> {
        debug_assert_eq!(self.state, State::AwaitRead);
        self.state = State::Idle;
        let n = res?;
        if n == 0 {
            return Err(WatchError::EndOfStream);
        }
        ktrace!("async fill: {} bytes", n);
        self.buffer.grow(n);
        self.buffer.pop().map(Event::from)
    }
}

impl<S, B> WatchSession<S, B>
where
    S: EventSource,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Next record, blocking on the source when the buffer is drained.
    ///
    /// A failed read leaves the buffer empty, so the call can be retried.
    /// A successful zero-byte read is reported as
    /// [`WatchError::EndOfStream`].
    ///
    /// # Panics
    /// Panics while an async request is outstanding.
    pub fn next_event(&mut self) -> Result<EventRef<'_>> {
        self.assert_idle("next_event");
        if self.buffer.pending_size() == 0 {
            self.buffer.reset();
            let n = self.source.read(self.buffer.free_region())?;
            if n == 0 {
                return Err(WatchError::EndOfStream);
            }
            ktrace!("fill: {} bytes", n);
            self.buffer.grow(n);
        }
        self.buffer.pop()
    }

    /// [`next_event`](Self::next_event), copied out of the buffer.
    pub fn next_owned(&mut self) -> Result<Event> {
        self.next_event().map(Event::from)
    }
}

impl<S: std::fmt::Debug, B: AsRef<[u8]>> std::fmt::Debug for WatchSession<S, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("source", &self.source)
            .field("buffer", &self.buffer)
            .field("state", &self.state)
            .finish()
    }
}
