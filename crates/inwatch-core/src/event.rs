//! Event views and owned events.
//!
//! [`EventRef`] borrows one record in place inside an `EventBuffer`.
//! [`Event`] owns a copy and can outlive a refill; it is also what callers
//! build to inject synthetic records with `EventBuffer::try_push`.

use crate::mask;
use crate::record::{padded_name_len, Cookie, Mask, RawHeader, WatchDescriptor, HEADER_SIZE};

use std::ffi::OsStr;
use std::fmt;
use std::os::unix::ffi::OsStrExt;

/// Borrowed view of one record.
#[derive(Clone, Copy)]
pub struct EventRef<'a> {
    header: RawHeader,
    /// Name bytes including NUL padding, exactly `header.len` long.
    raw_name: &'a [u8],
}

impl<'a> EventRef<'a> {
    /// Parse the record at the start of `bytes`.
    ///
    /// Returns `None` if the header or the name runs past the slice.
    pub fn parse(bytes: &'a [u8]) -> Option<Self> {
        let header = RawHeader::decode(bytes)?;
        let raw_name = bytes.get(HEADER_SIZE..header.record_size())?;
        Some(Self { header, raw_name })
    }

    #[inline]
    pub fn wd(&self) -> WatchDescriptor {
        self.header.wd
    }

    #[inline]
    pub fn mask(&self) -> Mask {
        self.header.mask
    }

    #[inline]
    pub fn cookie(&self) -> Cookie {
        self.header.cookie
    }

    /// Name length as stored, padding included.
    #[inline]
    pub fn padded_len(&self) -> u32 {
        self.header.len
    }

    /// File name with the NUL padding stripped. Empty for events on the
    /// watched object itself.
    pub fn name(&self) -> &'a OsStr {
        let end = self.raw_name.iter().position(|&b| b == 0).unwrap_or(self.raw_name.len());
        OsStr::from_bytes(&self.raw_name[..end])
    }

    /// Bytes this record occupies in the buffer.
    #[inline]
    pub fn record_size(&self) -> usize {
        self.header.record_size()
    }

    #[inline]
    pub fn is(&self, bits: Mask) -> bool {
        mask::contains(self.header.mask, bits)
    }

    pub fn to_owned(&self) -> Event {
        Event::from(*self)
    }
}

impl fmt::Debug for EventRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRef")
            .field("wd", &self.wd())
            .field("mask", &format_args!("{:#x}", self.mask()))
            .field("cookie", &self.cookie())
            .field("name", &self.name())
            .finish()
    }
}

/// An owned event.
///
/// `padded_len()` is the name length the record occupies on the wire.
/// `Event::new` pads to 4 bytes while the kernel pads further, so equality
/// ignores it and compares wd, mask, cookie and name only.
#[derive(Clone)]
pub struct Event {
    wd: WatchDescriptor,
    mask: Mask,
    cookie: Cookie,
    /// Name bytes without padding.
    name: Vec<u8>,
    len: u32,
}

impl Event {
    pub fn new(wd: WatchDescriptor, mask: Mask, cookie: Cookie, name: impl AsRef<OsStr>) -> Self {
        let bytes = name.as_ref().as_bytes();
        // Keep everything before an embedded NUL, as a C string would.
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let name = bytes[..end].to_vec();
        let len = padded_name_len(name.len()) as u32;
        Self { wd, mask, cookie, name, len }
    }

    #[inline]
    pub fn wd(&self) -> WatchDescriptor {
        self.wd
    }

    #[inline]
    pub fn mask(&self) -> Mask {
        self.mask
    }

    #[inline]
    pub fn cookie(&self) -> Cookie {
        self.cookie
    }

    #[inline]
    pub fn padded_len(&self) -> u32 {
        self.len
    }

    pub fn name(&self) -> &OsStr {
        OsStr::from_bytes(&self.name)
    }

    #[inline]
    pub fn is(&self, bits: Mask) -> bool {
        mask::contains(self.mask, bits)
    }

    pub(crate) fn header(&self) -> RawHeader {
        RawHeader { wd: self.wd, mask: self.mask, cookie: self.cookie, len: self.len }
    }

    pub(crate) fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    #[inline]
    pub fn record_size(&self) -> usize {
        HEADER_SIZE + self.len as usize
    }
}

/// The empty event: no watch, no mask, no name.
impl Default for Event {
    fn default() -> Self {
        Self { wd: -1, mask: 0, cookie: 0, name: Vec::new(), len: 0 }
    }
}

impl From<EventRef<'_>> for Event {
    fn from(r: EventRef<'_>) -> Self {
        Self {
            wd: r.wd(),
            mask: r.mask(),
            cookie: r.cookie(),
            name: r.name().as_bytes().to_vec(),
            len: r.padded_len(),
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.wd == other.wd
            && self.mask == other.mask
            && self.cookie == other.cookie
            && self.name == other.name
    }
}

impl Eq for Event {}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("wd", &self.wd)
            .field("mask", &format_args!("{:#x}", self.mask))
            .field("cookie", &self.cookie)
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_padding() {
        let e = Event::new(1, mask::CREATE, 0, "file.txt");
        assert_eq!(e.name(), "file.txt");
        assert_eq!(e.padded_len(), 12);
        assert_eq!(e.record_size(), 28);

        let empty = Event::new(1, mask::DELETE_SELF, 0, "");
        assert_eq!(empty.padded_len(), 0);
    }

    #[test]
    fn test_embedded_nul_truncates() {
        let e = Event::new(1, mask::CREATE, 0, OsStr::from_bytes(b"ab\0cd"));
        assert_eq!(e.name(), "ab");
        assert_eq!(e.padded_len(), 4);
    }

    #[test]
    fn test_parse_strips_padding() {
        let mut bytes = vec![0u8; HEADER_SIZE + 8];
        RawHeader { wd: 3, mask: mask::MODIFY, cookie: 9, len: 8 }.encode(&mut bytes);
        bytes[HEADER_SIZE..HEADER_SIZE + 3].copy_from_slice(b"abc");

        let r = EventRef::parse(&bytes).unwrap();
        assert_eq!(r.wd(), 3);
        assert_eq!(r.cookie(), 9);
        assert_eq!(r.name(), "abc");
        assert!(r.is(mask::MODIFY));
        assert_eq!(r.record_size(), 24);
    }

    #[test]
    fn test_parse_truncated() {
        let mut bytes = vec![0u8; HEADER_SIZE + 4];
        RawHeader { wd: 1, mask: 0, cookie: 0, len: 8 }.encode(&mut bytes);
        assert!(EventRef::parse(&bytes).is_none());
        assert!(EventRef::parse(&bytes[..HEADER_SIZE - 1]).is_none());
    }

    #[test]
    fn test_equality_ignores_padding() {
        // Kernel-style record: "file.txt" padded to 16 bytes.
        let mut bytes = vec![0u8; HEADER_SIZE + 16];
        RawHeader { wd: 1, mask: mask::CREATE, cookie: 0, len: 16 }.encode(&mut bytes);
        bytes[HEADER_SIZE..HEADER_SIZE + 8].copy_from_slice(b"file.txt");
        let kernel = Event::from(EventRef::parse(&bytes).unwrap());

        let built = Event::new(1, mask::CREATE, 0, "file.txt");
        assert_ne!(kernel.padded_len(), built.padded_len());
        assert_eq!(kernel, built);
        assert_ne!(kernel, Event::new(1, mask::CREATE, 0, "file.txu"));
        assert_ne!(kernel, Event::new(2, mask::CREATE, 0, "file.txt"));
    }

    #[test]
    fn test_default_is_empty() {
        let e = Event::default();
        assert_eq!(e.mask(), 0);
        assert!(e.name().is_empty());
    }
}
