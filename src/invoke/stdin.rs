//! Feeding a payload into a child's stdin without pipe deadlock.
//!
//! Payloads at or below [`DIRECT_WRITE_LIMIT`] are written synchronously:
//! they fit under common 32–64 KiB OS pipe buffers, so the write cannot
//! block on a child that has not started reading. Larger payloads move to a
//! dedicated writer thread so the parent can drain the child's output at
//! the same time; otherwise parent and child can each block on the other's
//! full buffer. The pipe end is closed on every path, including errors, so
//! the child always observes end-of-input.

use std::{
    io::{self, Write},
    process::ChildStdin,
    thread,
};

/// Largest payload written synchronously in the calling thread.
pub(super) const DIRECT_WRITE_LIMIT: usize = 16 * 1024;

/// Outcome handle for an in-flight or completed stdin write.
pub(super) enum FeedHandle {
    Done(io::Result<()>),
    Writer(thread::JoinHandle<io::Result<()>>),
}

/// Feed `payload` into `stdin`, choosing the write path by payload size.
pub(super) fn feed(stdin: Option<ChildStdin>, payload: Option<Vec<u8>>) -> FeedHandle {
    let Some(stdin) = stdin else {
        return FeedHandle::Done(Ok(()));
    };
    let Some(payload) = payload else {
        // Dropping the handle closes the pipe; the child sees EOF at once.
        drop(stdin);
        return FeedHandle::Done(Ok(()));
    };
    if payload.len() <= DIRECT_WRITE_LIMIT {
        let mut pipe = stdin;
        let result = pipe.write_all(&payload);
        drop(pipe);
        FeedHandle::Done(result)
    } else {
        FeedHandle::Writer(thread::spawn(move || {
            let mut pipe = stdin;
            pipe.write_all(&payload)
        }))
    }
}

impl FeedHandle {
    /// Wait for the write to finish. A broken pipe is tolerated: the child
    /// stopped reading, and its exit status tells that story.
    pub(super) fn finish(self) -> io::Result<()> {
        let result = match self {
            Self::Done(result) => result,
            Self::Writer(handle) => handle
                .join()
                .map_err(|_| io::Error::other("stdin writer thread panicked"))?,
        };
        match result {
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    }

    /// Join the writer on an abort path without letting its outcome mask
    /// the primary error.
    pub(super) fn abandon(self) {
        match self {
            Self::Done(_) => {}
            Self::Writer(handle) => {
                if handle.join().is_err() {
                    tracing::warn!("stdin writer thread panicked during cleanup");
                }
            }
        }
    }
}
