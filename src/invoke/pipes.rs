//! Drain-thread management for a child's output pipes.
//!
//! Each output stream is drained on its own thread so the parent makes
//! concurrent progress on stdout, stderr, and stdin; draining one stream at
//! a time can deadlock once the child fills the unread stream's OS buffer.
//! Both drains share one cumulative byte budget; the first read that pushes
//! the total past the cap trips an abort flag the supervising wait loop
//! observes.

use std::{
    io::{self, Read},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread,
};

const DRAIN_CHUNK_SIZE: usize = 8192;

/// Which output stream a drain is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub(super) const fn describe(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Cumulative byte budget shared by both output drains of one call.
#[derive(Clone, Debug)]
pub(super) struct OutputBudget {
    consumed: Arc<AtomicU64>,
    tripped: Arc<AtomicBool>,
    cap: Option<u64>,
}

impl OutputBudget {
    pub(super) fn new(cap: Option<u64>) -> Self {
        Self {
            consumed: Arc::new(AtomicU64::new(0)),
            tripped: Arc::new(AtomicBool::new(false)),
            cap,
        }
    }

    /// Record `read` freshly drained bytes. Returns `false` once the
    /// cumulative total exceeds the cap; the flag stays tripped for the
    /// call's lifetime.
    pub(super) fn record(&self, read: usize) -> bool {
        let read = u64::try_from(read).unwrap_or(u64::MAX);
        let total = self
            .consumed
            .fetch_add(read, Ordering::SeqCst)
            .saturating_add(read);
        match self.cap {
            Some(cap) if total > cap => {
                self.tripped.store(true, Ordering::SeqCst);
                false
            }
            _ => true,
        }
    }

    pub(super) fn consumed(&self) -> u64 {
        self.consumed.load(Ordering::SeqCst)
    }

    pub(super) fn exceeded(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    pub(super) const fn is_bounded(&self) -> bool {
        self.cap.is_some()
    }
}

pub(super) type DrainHandle = thread::JoinHandle<io::Result<Vec<u8>>>;

/// Start a drain thread for `pipe`, if the pipe exists.
pub(super) fn spawn_drain<R>(
    pipe: Option<R>,
    stream: StreamKind,
    budget: OutputBudget,
) -> Option<DrainHandle>
where
    R: Read + Send + 'static,
{
    pipe.map(|reader| thread::spawn(move || drain(reader, stream, &budget)))
}

fn drain<R>(mut reader: R, stream: StreamKind, budget: &OutputBudget) -> io::Result<Vec<u8>>
where
    R: Read,
{
    let mut buf = Vec::new();
    let mut chunk = [0_u8; DRAIN_CHUNK_SIZE];
    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        buf.extend(chunk.iter().take(read).copied());
        if !budget.record(read) {
            tracing::debug!(
                stream = stream.describe(),
                "output budget exhausted; drain stopping"
            );
            break;
        }
    }
    Ok(buf)
}

/// Join a drain and take its bytes. A missing pipe yields an empty buffer.
pub(super) fn join_drain(handle: Option<DrainHandle>) -> io::Result<Vec<u8>> {
    match handle {
        Some(join_handle) => join_handle
            .join()
            .map_err(|_| io::Error::other("drain thread panicked"))?,
        None => Ok(Vec::new()),
    }
}

/// Join both drains on an abort path, logging anomalies instead of letting
/// them mask the primary error.
pub(super) fn cleanup_drains(
    stdout_drain: &mut Option<DrainHandle>,
    stderr_drain: &mut Option<DrainHandle>,
) {
    join_for_cleanup(StreamKind::Stdout, stdout_drain);
    join_for_cleanup(StreamKind::Stderr, stderr_drain);
}

fn join_for_cleanup(stream: StreamKind, handle: &mut Option<DrainHandle>) {
    if let Some(join_handle) = handle.take() {
        match join_handle.join() {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                tracing::warn!(
                    stream = stream.describe(),
                    %err,
                    "drain failed during cleanup"
                );
            }
            Err(join_err) => {
                tracing::warn!(
                    stream = stream.describe(),
                    ?join_err,
                    "drain thread panicked during cleanup"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn drain_collects_bytes_within_budget() {
        let data = b"payload".to_vec();
        let budget = OutputBudget::new(Some(128));
        let drained = drain(Cursor::new(data.clone()), StreamKind::Stdout, &budget)
            .expect("drain should succeed");
        assert_eq!(drained, data);
        assert_eq!(budget.consumed(), 7);
        assert!(!budget.exceeded());
    }

    #[test]
    fn drain_trips_budget_and_stops_reading() {
        let budget = OutputBudget::new(Some(8));
        let drained = drain(
            Cursor::new(vec![0_u8; DRAIN_CHUNK_SIZE * 4]),
            StreamKind::Stdout,
            &budget,
        )
        .expect("drain should stop, not fail");
        assert!(budget.exceeded());
        assert!(drained.len() <= DRAIN_CHUNK_SIZE);
    }

    #[test]
    fn budget_is_cumulative_across_streams() {
        let budget = OutputBudget::new(Some(10));
        assert!(budget.record(6));
        assert!(!budget.record(6), "second stream pushes total past cap");
        assert!(budget.exceeded());
        assert_eq!(budget.consumed(), 12);
    }

    #[test]
    fn unbounded_budget_never_trips() {
        let budget = OutputBudget::new(None);
        assert!(budget.record(usize::MAX));
        assert!(!budget.exceeded());
        assert!(!budget.is_bounded());
    }

    #[test]
    fn join_drain_without_pipe_yields_empty_buffer() {
        let drained = join_drain(None).expect("missing pipe is not an error");
        assert!(drained.is_empty());
    }
}
