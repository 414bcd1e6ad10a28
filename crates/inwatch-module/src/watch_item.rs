//! `WatchHandle` - RAII guard for one registered watch.
//!
//! Dropping an active handle issues `inotify_rm_watch`. Removal on drop is
//! best effort: the kernel may already have dropped the watch (the watched
//! file was deleted, or the watch was `ONESHOT`), in which case it answers
//! `EINVAL` and the handle logs and moves on.

use inwatch_core::error::{Result, WatchError};
use inwatch_core::record::WatchDescriptor;
use inwatch_core::{kdebug, kwarn};

use nix::errno::Errno;

use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};
use std::sync::Arc;

pub(crate) fn rm_watch(fd: &OwnedFd, wd: WatchDescriptor) -> Result<()> {
    let ret = unsafe { libc::inotify_rm_watch(fd.as_raw_fd(), wd) };
    if ret < 0 {
        return Err(WatchError::last_os_error());
    }
    kdebug!("watch {} removed", wd);
    Ok(())
}

/// One watch on one inotify instance.
#[must_use = "dropping a WatchHandle removes the watch"]
pub struct WatchHandle {
    wd: WatchDescriptor,
    fd: Arc<OwnedFd>,
    /// Cleared by `forget()`; suppresses removal on drop.
    active: bool,
}

impl WatchHandle {
    pub(crate) fn new(wd: WatchDescriptor, fd: Arc<OwnedFd>) -> Self {
        Self { wd, fd, active: true }
    }

    pub fn wd(&self) -> WatchDescriptor {
        self.wd
    }

    /// The owning inotify descriptor.
    pub fn fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Keep the watch for the lifetime of the inotify instance.
    pub fn forget(&mut self) {
        self.active = false;
    }

    /// Remove the watch now and report the outcome.
    pub fn remove(mut self) -> Result<()> {
        self.active = false;
        rm_watch(&self.fd, self.wd)
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        match rm_watch(&self.fd, self.wd) {
            Ok(()) => {}
            // Already gone: file deleted, ONESHOT fired, or removed by wd.
            Err(WatchError::Os(Errno::EINVAL)) => {
                kdebug!("watch {} already removed by the kernel", self.wd);
            }
            Err(e) => kwarn!("rm_watch({}) on fd {} failed: {}", self.wd, self.fd.as_raw_fd(), e),
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("wd", &self.wd)
            .field("fd", &self.fd.as_raw_fd())
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::inotify_fd::InotifyFd;
    use inwatch_core::mask;
    use inwatch_core::WatchError;
    use nix::errno::Errno;

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("inwatch-item-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_drop_removes_watch() {
        let dir = temp_dir("drop");
        let ino = InotifyFd::new().unwrap();
        let wd = {
            let h = ino.add_watch(&dir, mask::CREATE).unwrap();
            assert!(h.is_active());
            h.wd()
        };
        // Already removed by the drop above.
        assert_eq!(ino.rm_watch(wd), Err(WatchError::Os(Errno::EINVAL)));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_forget_keeps_watch() {
        let dir = temp_dir("forget");
        let ino = InotifyFd::new().unwrap();
        let wd = {
            let mut h = ino.add_watch(&dir, mask::CREATE).unwrap();
            h.forget();
            assert!(!h.is_active());
            h.wd()
        };
        assert_eq!(ino.rm_watch(wd), Ok(()));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_remove_reports_result() {
        let dir = temp_dir("remove");
        let ino = InotifyFd::new().unwrap();
        let h = ino.add_watch(&dir, mask::CREATE).unwrap();
        let wd = h.wd();
        assert_eq!(h.remove(), Ok(()));
        assert!(ino.rm_watch(wd).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_handle_outlives_instance() {
        let dir = temp_dir("outlive");
        let h = {
            let ino = InotifyFd::new().unwrap();
            ino.add_watch(&dir, mask::CREATE).unwrap()
        };
        // The descriptor is still open through the handle.
        assert!(h.fd() >= 0);
        assert_eq!(h.remove(), Ok(()));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
