//! The direct execution strategy and the shared child supervisor.
//!
//! One child process exists per invocation. The parent feeds stdin and
//! drains both output pipes concurrently, polls the child's exit under the
//! call's deadline, and on any abort — deadline, byte budget, or unexpected
//! fault — kills the child, reaps it, and joins every helper thread before
//! the error propagates. No path may leave a zombie process or a leaked
//! descriptor.

use std::{
    io,
    process::{Child, Command, ExitStatus, Stdio},
    time::{Duration, Instant},
};

use camino::Utf8Path;
use indexmap::IndexMap;
use wait_timeout::ChildExt;

use super::{
    error::{AbortCause, CallError},
    pipes::{self, OutputBudget, StreamKind},
    result::{CallOutput, exit_code},
    stdin,
};

/// Synthetic status for a missing target binary, mirroring the shell
/// convention for "command not found".
pub(super) const EXIT_NOT_FOUND: i32 = 127;

/// Synthetic status for a target binary that may not be executed.
pub(super) const EXIT_NO_PERMISSION: i32 = 126;

const SUPERVISE_POLL: Duration = Duration::from_millis(25);

/// A call's effective, per-call-resolved execution parameters.
pub(super) struct PreparedCall {
    pub(super) label: String,
    pub(super) input: Option<Vec<u8>>,
    pub(super) deadline: Option<Duration>,
    pub(super) cap: Option<u64>,
}

/// Run `argv` directly against `program` with piped standard streams.
pub(super) fn run_direct(
    program: &Utf8Path,
    argv: &[String],
    env: &IndexMap<String, String>,
    cwd: Option<&Utf8Path>,
    call: PreparedCall,
) -> Result<CallOutput, CallError> {
    let mut command = Command::new(program.as_std_path());
    command
        .args(argv)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in env {
        command.env(key, value);
    }
    if let Some(dir) = cwd {
        command.current_dir(dir.as_std_path());
    }
    run_child(command, call)
}

/// Spawn `command` and supervise it to completion under the call's bounds.
///
/// Shared by both strategies; the shell runner hands in a `sh -c` command.
pub(super) fn run_child(mut command: Command, call: PreparedCall) -> Result<CallOutput, CallError> {
    let PreparedCall {
        label,
        input,
        deadline,
        cap,
    } = call;

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => return spawn_fallback(label, err),
    };

    let feed = stdin::feed(child.stdin.take(), input);
    let budget = OutputBudget::new(cap);
    let mut stdout_drain = pipes::spawn_drain(child.stdout.take(), StreamKind::Stdout, budget.clone());
    let mut stderr_drain = pipes::spawn_drain(child.stderr.take(), StreamKind::Stderr, budget.clone());

    let status = match supervise(&mut child, &budget, deadline) {
        Ok(status) => status,
        Err(abort) => {
            terminate(&mut child);
            pipes::cleanup_drains(&mut stdout_drain, &mut stderr_drain);
            feed.abandon();
            return Err(match abort {
                Abort::Bound(cause) => CallError::Timeout {
                    command: label,
                    bytes_read: budget.consumed(),
                    cause,
                },
                Abort::Io(source) => CallError::Io {
                    command: label,
                    source,
                },
            });
        }
    };

    let stdout = match pipes::join_drain(stdout_drain.take()) {
        Ok(bytes) => bytes,
        Err(source) => {
            pipes::cleanup_drains(&mut stdout_drain, &mut stderr_drain);
            feed.abandon();
            return Err(CallError::Io {
                command: label,
                source,
            });
        }
    };
    let stderr = match pipes::join_drain(stderr_drain.take()) {
        Ok(bytes) => bytes,
        Err(source) => {
            feed.abandon();
            return Err(CallError::Io {
                command: label,
                source,
            });
        }
    };
    if let Err(source) = feed.finish() {
        return Err(CallError::Io {
            command: label,
            source,
        });
    }

    // The byte budget may only trip between the supervisor's last check and
    // the child's exit; it is still an abort, not a result.
    if budget.exceeded() {
        return Err(CallError::Timeout {
            command: label,
            bytes_read: budget.consumed(),
            cause: AbortCause::OutputCap,
        });
    }

    Ok(CallOutput::new(stdout, stderr, exit_code(status)))
}

enum Abort {
    Bound(AbortCause),
    Io(io::Error),
}

/// Poll the child's exit under the deadline and byte budget.
fn supervise(
    child: &mut Child,
    budget: &OutputBudget,
    deadline: Option<Duration>,
) -> Result<ExitStatus, Abort> {
    if deadline.is_none() && !budget.is_bounded() {
        return child.wait().map_err(Abort::Io);
    }
    let started = Instant::now();
    loop {
        if budget.exceeded() {
            return Err(Abort::Bound(AbortCause::OutputCap));
        }
        if let Some(limit) = deadline
            && started.elapsed() >= limit
        {
            return Err(Abort::Bound(AbortCause::Deadline));
        }
        match child.wait_timeout(SUPERVISE_POLL) {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(err) => return Err(Abort::Io(err)),
        }
    }
}

/// Kill and reap the child on an abort path. Runs unconditionally before
/// the abort error propagates; a child that already exited is fine.
fn terminate(child: &mut Child) {
    if let Err(err) = child.kill()
        && err.kind() != io::ErrorKind::InvalidInput
    {
        tracing::warn!(%err, "failed to kill child during abort");
    }
    if let Err(err) = child.wait() {
        tracing::warn!(%err, "failed to reap child during abort");
    }
}

/// Map a spawn failure onto the result path: a missing or unexecutable
/// target surfaces as a failed exit status, exactly as an exec failure in
/// the child would, rather than as a distinct error category.
fn spawn_fallback(label: String, err: io::Error) -> Result<CallOutput, CallError> {
    let status = match err.kind() {
        io::ErrorKind::NotFound => EXIT_NOT_FOUND,
        io::ErrorKind::PermissionDenied => EXIT_NO_PERMISSION,
        _ => {
            return Err(CallError::Io {
                command: label,
                source: err,
            });
        }
    };
    Ok(CallOutput::new(
        Vec::new(),
        err.to_string().into_bytes(),
        status,
    ))
}
