//! OS event source abstraction.
//!
//! An `EventSource` is whatever produces raw inotify records: the real
//! inotify fd in production, a scripted byte feed in tests.
//!
//! # Implementors
//!
//! - `InotifyFd` (inwatch-module): `read(2)` on an `inotify_init1` fd.

use crate::error::Result;

/// Blocking record producer.
///
/// **Contract:** one call to `read()` fills `buf` with zero or more
/// complete records and returns the byte count. It never splits a record
/// across calls. `Ok(0)` means the source is closed.
pub trait EventSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

impl<T: EventSource + ?Sized> EventSource for &mut T {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}

impl<T: EventSource + ?Sized> EventSource for Box<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }
}
