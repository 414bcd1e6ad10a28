//! Fixed-capacity buffer for raw inotify records.
//!
//! One `read()` on an inotify fd returns any number of complete records
//! packed back to back. `EventBuffer` holds those bytes and hands them out
//! one record at a time.
//!
//! ```text
//!   0            read             write                     capacity
//!   ├────────────┼────────────────┼─────────────────────────┤
//!   │  consumed  │    pending     │          free           │
//!   └────────────┴────────────────┴─────────────────────────┘
//!                 pop() advances ─▶ grow(n) / try_push ─▶
//! ```
//!
//! There is no compaction and no wraparound: once the pending region is
//! drained the owner calls [`EventBuffer::reset`] and refills from the
//! start. Cursors are plain indices, so the buffer can be moved freely.

use crate::error::{Result, WatchError};
use crate::event::{Event, EventRef};
use crate::record::HEADER_SIZE;

/// Record buffer over any contiguous byte storage.
///
/// `S` is usually `Box<[u8]>` (owned) or `&mut [u8]` (borrowed).
pub struct EventBuffer<S = Box<[u8]>> {
    storage: S,
    /// Start of the pending region.
    read: usize,
    /// End of the pending region, start of free space.
    write: usize,
}

impl EventBuffer<Box<[u8]>> {
    /// Allocate a zeroed buffer of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(vec![0u8; capacity].into_boxed_slice())
    }
}

impl<S> EventBuffer<S>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Bind a buffer to `storage`. The whole region starts out free.
    pub fn new(storage: S) -> Self {
        Self { storage, read: 0, write: 0 }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.as_ref().len()
    }

    /// Bytes fetched but not yet delivered.
    #[inline]
    pub fn pending_size(&self) -> usize {
        self.write - self.read
    }

    /// Bytes available for the next fill.
    #[inline]
    pub fn free_size(&self) -> usize {
        self.capacity() - self.write
    }

    /// The raw pending region `[read, write)`.
    #[inline]
    pub fn pending(&self) -> &[u8] {
        &self.storage.as_ref()[self.read..self.write]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    /// Rewind both cursors to the start.
    ///
    /// Only valid once the pending region is drained; anything still
    /// pending is discarded.
    pub fn reset(&mut self) {
        debug_assert!(
            self.is_empty(),
            "EventBuffer::reset with {} pending bytes",
            self.pending_size()
        );
        self.read = 0;
        self.write = 0;
    }

    /// Commit `n` bytes an external fill wrote at the write cursor.
    ///
    /// # Panics
    /// Panics if `n > free_size()`.
    pub fn grow(&mut self, n: usize) {
        assert!(
            n <= self.free_size(),
            "EventBuffer::grow({}) exceeds free space {}",
            n,
            self.free_size()
        );
        self.write += n;
    }

    /// The free region, for a synchronous fill followed by `grow`.
    #[inline]
    pub fn free_region(&mut self) -> &mut [u8] {
        let write = self.write;
        &mut self.storage.as_mut()[write..]
    }

    /// Raw pointer and length of the free region, for completion-based
    /// reads that outlive this borrow.
    ///
    /// The pointer stays valid as long as the storage is neither moved nor
    /// dropped. Heap storage (`Box<[u8]>`, `Vec<u8>`) satisfies this even
    /// when the buffer itself moves.
    #[inline]
    pub fn free_region_ptr(&mut self) -> (*mut u8, usize) {
        let region = self.free_region();
        (region.as_mut_ptr(), region.len())
    }

    /// The record at the read cursor, without consuming it.
    ///
    /// # Panics
    /// Panics if the buffer is empty.
    pub fn peek(&self) -> Result<EventRef<'_>> {
        assert!(!self.is_empty(), "EventBuffer::peek on empty buffer");
        EventRef::parse(self.pending()).ok_or(WatchError::CorruptRecord { offset: self.read })
    }

    /// The record at the read cursor; advances past it.
    ///
    /// A truncated record leaves the cursors where they were.
    ///
    /// # Panics
    /// Panics if the buffer is empty.
    pub fn pop(&mut self) -> Result<EventRef<'_>> {
        assert!(!self.is_empty(), "EventBuffer::pop on empty buffer");
        let start = self.read;
        let pending = &self.storage.as_ref()[start..self.write];
        let event = EventRef::parse(pending).ok_or(WatchError::CorruptRecord { offset: start })?;
        self.read = start + event.record_size();
        Ok(event)
    }

    /// Append a synthetic record at the write cursor.
    ///
    /// All or nothing: returns `false` and leaves the buffer untouched if
    /// the record does not fit.
    pub fn try_push(&mut self, event: &Event) -> bool {
        let size = event.record_size();
        if size > self.free_size() {
            return false;
        }
        let region = &mut self.free_region()[..size];
        event.header().encode(&mut region[..HEADER_SIZE]);
        let name = event.name_bytes();
        let (text, padding) = region[HEADER_SIZE..].split_at_mut(name.len());
        text.copy_from_slice(name);
        padding.fill(0);
        self.write += size;
        true
    }

    /// Iterate over the pending records, consuming them.
    pub fn drain(&mut self) -> Drain<'_, S> {
        Drain { buffer: self, failed: false }
    }
}

impl<S: AsRef<[u8]>> std::fmt::Debug for EventBuffer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBuffer")
            .field("capacity", &self.storage.as_ref().len())
            .field("read", &self.read)
            .field("write", &self.write)
            .finish()
    }
}

/// Iterator returned by [`EventBuffer::drain`].
///
/// Stops after the first corrupt record.
pub struct Drain<'b, S> {
    buffer: &'b mut EventBuffer<S>,
    failed: bool,
}

impl<'b, S> Iterator for Drain<'b, S>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
{
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.buffer.is_empty() {
            return None;
        }
        match self.buffer.pop() {
            Ok(event) => Some(Ok(event.to_owned())),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
