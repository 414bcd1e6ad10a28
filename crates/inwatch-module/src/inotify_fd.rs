//! `InotifyFd` - default `EventSource` implementation.
//!
//! Owns one `inotify_init1(IN_CLOEXEC)` descriptor. Reads are plain
//! blocking `read(2)` calls; the async path hands the raw fd to an
//! `Executor` instead.
//!
//! The descriptor is reference counted so that every [`WatchHandle`]
//! keeps it open: a handle dropped after the session still removes its
//! watch from the right instance instead of a recycled fd number.

use inwatch_core::error::{Result, WatchError};
use inwatch_core::record::{Mask, WatchDescriptor};
use inwatch_core::source::EventSource;
use inwatch_core::{kdebug, ktrace};

use crate::watch_item::WatchHandle;

use nix::errno::Errno;

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::path::Path;
use std::sync::Arc;

pub struct InotifyFd {
    fd: Arc<OwnedFd>,
}

impl InotifyFd {
    /// Create a blocking inotify instance.
    pub fn new() -> Result<Self> {
        Self::with_flags(libc::IN_CLOEXEC)
    }

    /// Create a non-blocking instance (`IN_NONBLOCK`). Reads with nothing
    /// queued fail with `EAGAIN` instead of sleeping.
    pub fn nonblocking() -> Result<Self> {
        Self::with_flags(libc::IN_CLOEXEC | libc::IN_NONBLOCK)
    }

    fn with_flags(flags: libc::c_int) -> Result<Self> {
        let fd = unsafe { libc::inotify_init1(flags) };
        if fd < 0 {
            return Err(WatchError::last_os_error());
        }
        kdebug!("inotify fd {} opened", fd);
        // Safety: fd was just returned by inotify_init1 and is owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self { fd: Arc::new(fd) })
    }

    /// Start watching `path` for the events in `mask`.
    ///
    /// Adding a path that is already watched returns the same watch
    /// descriptor (and replaces its mask unless `mask::MASK_ADD` is set).
    pub fn add_watch(&self, path: impl AsRef<Path>, mask: Mask) -> Result<WatchHandle> {
        let path = path.as_ref();
        let registration_error = |errno| WatchError::Registration { path: path.to_path_buf(), errno };

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| registration_error(Errno::EINVAL))?;
        let wd = unsafe { libc::inotify_add_watch(self.fd.as_raw_fd(), c_path.as_ptr(), mask) };
        if wd < 0 {
            return Err(registration_error(Errno::last()));
        }
        kdebug!("watch {} added on {} (mask {:#x})", wd, path.display(), mask);
        Ok(WatchHandle::new(wd, Arc::clone(&self.fd)))
    }

    /// Remove a watch by descriptor.
    pub fn rm_watch(&self, wd: WatchDescriptor) -> Result<()> {
        crate::watch_item::rm_watch(&self.fd, wd)
    }

    pub fn fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl EventSource for InotifyFd {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            let ret = unsafe {
                libc::read(self.fd.as_raw_fd(), buf.as_mut_ptr() as *mut libc::c_void, buf.len())
            };
            if ret >= 0 {
                ktrace!("fd {}: read {} bytes", self.fd.as_raw_fd(), ret);
                return Ok(ret as usize);
            }
            match Errno::last() {
                Errno::EINTR => continue,
                errno => return Err(WatchError::Os(errno)),
            }
        }
    }
}

impl AsRawFd for InotifyFd {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl std::fmt::Debug for InotifyFd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InotifyFd").field("fd", &self.fd.as_raw_fd()).finish()
    }
}
