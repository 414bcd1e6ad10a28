//! # inwatch-core
//!
//! Platform-agnostic core of inwatch: the inotify record wire format, the
//! fixed-capacity [`EventBuffer`] records are parsed from, and the trait
//! boundaries the session is built against.
//!
//! Nothing here issues a syscall. OS handles and executors live in
//! `inwatch-module`.
//!
//! ## Modules
//!
//! - `record` - wire header layout and size constants
//! - `mask` - event mask bits
//! - `event` - borrowed `EventRef` and owned `Event`
//! - `buffer` - the four-cursor `EventBuffer`
//! - `source` - `EventSource` trait (blocking reads)
//! - `executor` - `Scheduler` / `Executor` traits (async delivery)
//! - `error` - `WatchError`
//! - `kprint` - leveled logging macros
//! - `env` - environment variable helpers

pub mod record;
pub mod mask;
pub mod event;
pub mod buffer;
pub mod source;
pub mod executor;
pub mod error;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use buffer::EventBuffer;
pub use error::{Result, WatchError};
pub use event::{Event, EventRef};
pub use executor::{Executor, ReadCompletion, Scheduler, Task};
pub use record::{Cookie, Mask, WatchDescriptor, HEADER_SIZE, MIN_BUFFER_SIZE};
pub use source::EventSource;
pub use env::{env_get, env_get_bool, env_get_opt};
