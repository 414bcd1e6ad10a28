//! inwatch error types.
//!
//! Every OS error code is normalized to [`Errno`] at the point it leaves a
//! syscall, so callers match on one error domain regardless of which
//! backend produced it.

use nix::errno::Errno;

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    /// OS error during a read, init, or removal.
    Os(Errno),
    /// `inotify_add_watch` rejected the path.
    Registration { path: PathBuf, errno: Errno },
    /// A read succeeded with zero bytes: the handle was closed.
    EndOfStream,
    /// The pending region ends in a truncated record.
    CorruptRecord { offset: usize },
    /// io_uring submission queue is full.
    RingFull,
    /// Executor setup failed.
    ExecutorSetup(Errno),
}

impl WatchError {
    /// The normalized errno, if this error carries one.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Self::Os(e) | Self::ExecutorSetup(e) => Some(*e),
            Self::Registration { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Map a negative-errno return value (io_uring CQE style).
    pub fn from_neg_errno(ret: i32) -> Self {
        Self::Os(Errno::from_raw(-ret))
    }

    /// Capture `errno` after a failed libc call.
    pub fn last_os_error() -> Self {
        Self::Os(Errno::last())
    }
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Os(e) => write!(f, "OS error: {}", e),
            Self::Registration { path, errno } => {
                write!(f, "add watch {}: {}", path.display(), errno)
            }
            Self::EndOfStream => write!(f, "end of stream"),
            Self::CorruptRecord { offset } => write!(f, "truncated record at offset {}", offset),
            Self::RingFull => write!(f, "ring full"),
            Self::ExecutorSetup(e) => write!(f, "executor setup: {}", e),
        }
    }
}

impl std::error::Error for WatchError {}

impl From<Errno> for WatchError {
    fn from(e: Errno) -> Self {
        Self::Os(e)
    }
}

impl From<std::io::Error> for WatchError {
    fn from(e: std::io::Error) -> Self {
        match e.raw_os_error() {
            Some(code) => Self::Os(Errno::from_raw(code)),
            None => Self::Os(Errno::EIO),
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
