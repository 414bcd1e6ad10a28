//! Event mask bits.
//!
//! Values match `<sys/inotify.h>`. The same word is used both when adding
//! a watch (what to report) and in delivered records (what happened).

use crate::record::Mask;

// ── Events ──
pub const ACCESS: Mask = 0x0000_0001;
pub const MODIFY: Mask = 0x0000_0002;
pub const ATTRIB: Mask = 0x0000_0004;
pub const CLOSE_WRITE: Mask = 0x0000_0008;
pub const CLOSE_NOWRITE: Mask = 0x0000_0010;
pub const OPEN: Mask = 0x0000_0020;
pub const MOVED_FROM: Mask = 0x0000_0040;
pub const MOVED_TO: Mask = 0x0000_0080;
pub const CREATE: Mask = 0x0000_0100;
pub const DELETE: Mask = 0x0000_0200;
pub const DELETE_SELF: Mask = 0x0000_0400;
pub const MOVE_SELF: Mask = 0x0000_0800;

pub const CLOSE: Mask = CLOSE_WRITE | CLOSE_NOWRITE;
pub const MOVE: Mask = MOVED_FROM | MOVED_TO;
pub const ALL_EVENTS: Mask = ACCESS
    | MODIFY
    | ATTRIB
    | CLOSE_WRITE
    | CLOSE_NOWRITE
    | OPEN
    | MOVED_FROM
    | MOVED_TO
    | CREATE
    | DELETE
    | DELETE_SELF
    | MOVE_SELF;

// ── Set by the kernel in delivered records ──
pub const UNMOUNT: Mask = 0x0000_2000;
pub const Q_OVERFLOW: Mask = 0x0000_4000;
pub const IGNORED: Mask = 0x0000_8000;
pub const ISDIR: Mask = 0x4000_0000;

// ── Watch options (add_watch only) ──
pub const ONLYDIR: Mask = 0x0100_0000;
pub const DONT_FOLLOW: Mask = 0x0200_0000;
pub const EXCL_UNLINK: Mask = 0x0400_0000;
pub const MASK_ADD: Mask = 0x2000_0000;
pub const ONESHOT: Mask = 0x8000_0000;

/// True if any bit of `bits` is set in `mask`.
#[inline]
pub const fn contains(mask: Mask, bits: Mask) -> bool {
    mask & bits != 0
}
