//! Blocking delivery against a real inotify instance and scripted sources.

use inwatch::{mask, EventBuffer, EventSource, Result, SessionConfig, WatchError, WatchSession};
use inwatch::{kwarn, MIN_BUFFER_SIZE};

use nix::errno::Errno;

use std::path::PathBuf;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("inwatch-sync-{}-{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn open() -> Option<WatchSession> {
    match WatchSession::open(&SessionConfig::default()) {
        Ok(s) => Some(s),
        Err(e) => {
            kwarn!("skipping inotify test: {}", e);
            None
        }
    }
}

#[test]
fn test_create_then_delete() {
    let Some(mut session) = open() else { return };
    let dir = temp_dir("create-delete");
    let watch = session.add_watch(&dir, mask::CREATE | mask::DELETE).unwrap();

    let file = dir.join("file.txt");
    std::fs::write(&file, b"x").unwrap();
    std::fs::remove_file(&file).unwrap();

    let created = session.next_owned().unwrap();
    assert_eq!(created.wd(), watch.wd());
    assert!(created.is(mask::CREATE));
    assert_eq!(created.name(), "file.txt");

    let deleted = session.next_event().unwrap();
    assert!(deleted.is(mask::DELETE));
    assert_eq!(deleted.name(), "file.txt");

    drop(watch);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_kernel_event_equals_built_event() {
    let Some(mut session) = open() else { return };
    let dir = temp_dir("equal");
    let watch = session.add_watch(&dir, mask::CREATE).unwrap();
    std::fs::write(dir.join("file.txt"), b"x").unwrap();

    let got = session.next_owned().unwrap();
    assert_eq!(got, inwatch::Event::new(watch.wd(), mask::CREATE, 0, "file.txt"));

    drop(watch);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_removed_watch_reports_ignored() {
    let Some(mut session) = open() else { return };
    let dir = temp_dir("ignored");
    let watch = session.add_watch(&dir, mask::ALL_EVENTS).unwrap();
    let wd = watch.wd();
    watch.remove().unwrap();

    let ev = session.next_owned().unwrap();
    assert_eq!(ev.wd(), wd);
    assert!(ev.is(mask::IGNORED));
    assert_eq!(ev.name(), "");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_path_is_registration_error() {
    let Some(session) = open() else { return };
    let err = session.add_watch("/nonexistent/inwatch/path", mask::CREATE).unwrap_err();
    assert!(matches!(err, WatchError::Registration { errno: Errno::ENOENT, .. }));
}

struct Closed;

impl EventSource for Closed {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Ok(0)
    }
}

struct Failing(Errno);

impl EventSource for Failing {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(WatchError::Os(self.0))
    }
}

#[test]
fn test_end_of_stream_differs_from_os_error() {
    let mut closed = WatchSession::new(Closed, EventBuffer::with_capacity(MIN_BUFFER_SIZE));
    let eos = closed.next_event().unwrap_err();
    assert_eq!(eos, WatchError::EndOfStream);
    assert_eq!(eos.errno(), None);

    let mut failing = WatchSession::new(Failing(Errno::EIO), EventBuffer::with_capacity(MIN_BUFFER_SIZE));
    let err = failing.next_event().unwrap_err();
    assert!(matches!(err, WatchError::Os(Errno::EIO)));
    assert_ne!(err, eos);
}

#[test]
fn test_borrowed_buffer_session() {
    let mut storage = vec![0u8; MIN_BUFFER_SIZE * 2];
    let mut session = WatchSession::new(Closed, EventBuffer::new(&mut storage[..]));
    session.buffer_mut().try_push(&inwatch::Event::new(1, mask::ATTRIB, 0, "meta"));
    assert_eq!(session.next_event().unwrap().name(), "meta");
    assert_eq!(session.next_event().unwrap_err(), WatchError::EndOfStream);
}
