//! Kernel record wire format.
//!
//! One inotify record is a fixed header followed by `len` bytes of name:
//!
//! ```text
//! offset  0: wd      i32
//! offset  4: mask    u32
//! offset  8: cookie  u32
//! offset 12: len     u32
//! offset 16: name    [u8; len]   NUL-terminated, NUL-padded
//! ```
//!
//! This mirrors `struct inotify_event` from `<sys/inotify.h>`. Fields are
//! native endian. Records are packed back to back; the next record starts
//! `HEADER_SIZE + len` bytes after the current one.

/// Watch descriptor returned by `inotify_add_watch`.
pub type WatchDescriptor = i32;

/// Event type bitmask (see [`crate::mask`]).
pub type Mask = u32;

/// Correlates the two halves of a rename.
pub type Cookie = u32;

/// Size of the fixed record header.
pub const HEADER_SIZE: usize = 16;

/// Alignment the kernel pads names to.
pub const RECORD_ALIGN: usize = std::mem::align_of::<RawHeader>();

/// Longest file name component (`NAME_MAX`).
pub const NAME_MAX: usize = 255;

/// Smallest buffer guaranteed to hold any single record.
pub const MIN_BUFFER_SIZE: usize = HEADER_SIZE + NAME_MAX + 1;

/// Record header, laid out like `struct inotify_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct RawHeader {
    pub wd: WatchDescriptor,
    pub mask: Mask,
    pub cookie: Cookie,
    pub len: u32,
}

impl RawHeader {
    /// Decode a header from the first `HEADER_SIZE` bytes of `bytes`.
    ///
    /// Returns `None` if fewer than `HEADER_SIZE` bytes are available.
    #[inline]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let b = bytes.get(..HEADER_SIZE)?;
        Some(Self {
            wd: i32::from_ne_bytes([b[0], b[1], b[2], b[3]]),
            mask: u32::from_ne_bytes([b[4], b[5], b[6], b[7]]),
            cookie: u32::from_ne_bytes([b[8], b[9], b[10], b[11]]),
            len: u32::from_ne_bytes([b[12], b[13], b[14], b[15]]),
        })
    }

    /// Encode into the first `HEADER_SIZE` bytes of `out`.
    ///
    /// # Panics
    /// Panics if `out` is shorter than `HEADER_SIZE`.
    #[inline]
    pub fn encode(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.wd.to_ne_bytes());
        out[4..8].copy_from_slice(&self.mask.to_ne_bytes());
        out[8..12].copy_from_slice(&self.cookie.to_ne_bytes());
        out[12..16].copy_from_slice(&self.len.to_ne_bytes());
    }

    /// Total bytes this record occupies in the buffer.
    #[inline]
    pub fn record_size(&self) -> usize {
        HEADER_SIZE + self.len as usize
    }
}

/// Round a name length up so a NUL terminator fits and the next record
/// starts on a `RECORD_ALIGN` boundary. Empty names stay empty.
#[inline]
pub const fn padded_name_len(name_len: usize) -> usize {
    if name_len == 0 {
        return 0;
    }
    (name_len + 1 + RECORD_ALIGN - 1) / RECORD_ALIGN * RECORD_ALIGN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_matches_kernel_layout() {
        assert_eq!(HEADER_SIZE, std::mem::size_of::<RawHeader>());
        assert_eq!(HEADER_SIZE, std::mem::size_of::<libc::inotify_event>());
        assert_eq!(RECORD_ALIGN, std::mem::align_of::<libc::inotify_event>());
    }

    #[test]
    fn test_decode_short_slice() {
        assert!(RawHeader::decode(&[0u8; HEADER_SIZE - 1]).is_none());
    }

    #[test]
    fn test_encode_decode() {
        let h = RawHeader { wd: -1, mask: 0x100, cookie: 7, len: 12 };
        let mut out = [0u8; HEADER_SIZE];
        h.encode(&mut out);
        assert_eq!(RawHeader::decode(&out), Some(h));
        assert_eq!(h.record_size(), 28);
    }

    #[test]
    fn test_padded_name_len() {
        assert_eq!(padded_name_len(0), 0);
        assert_eq!(padded_name_len(1), 4);
        assert_eq!(padded_name_len(3), 4);
        assert_eq!(padded_name_len(4), 8);
        assert_eq!(padded_name_len(8), 12);
        assert_eq!(padded_name_len(NAME_MAX), 256);
    }
}
