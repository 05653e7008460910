//! Classified call outcomes.
//!
//! Every call either returns a well-formed [`super::CallOutput`] or raises
//! exactly one of these errors; nothing is swallowed or logged-and-ignored.
//! Cleanup (descriptor closing, child reaping) always completes before an
//! error propagates.

use std::{fmt, io};

use miette::Diagnostic;
use thiserror::Error;

/// Why a bounded call was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortCause {
    /// The wall-clock deadline expired before the child exited.
    Deadline,
    /// The cumulative stdout+stderr byte budget was exhausted.
    OutputCap,
}

impl AbortCause {
    /// Human-readable name of the violated bound.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Deadline => "wall-clock deadline",
            Self::OutputCap => "output byte cap",
        }
    }
}

impl fmt::Display for AbortCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Errors raised while executing a call.
#[derive(Debug, Error, Diagnostic)]
pub enum CallError {
    /// A bound was violated; the child was killed and reaped before this
    /// surfaced. Recoverable: the caller decides whether to retry.
    #[error("command '{command}' exceeded its {cause} after {bytes_read} bytes of output")]
    #[diagnostic(code(gitcall::invoke::timeout))]
    Timeout {
        /// Rendered command line for diagnostics.
        command: String,
        /// Bytes drained from the child before the abort.
        bytes_read: u64,
        /// Which bound was violated.
        cause: AbortCause,
    },

    /// The child exited non-zero and the caller opted into strict mode.
    #[error("command '{command}' exited with status {status}: {stderr}")]
    #[diagnostic(code(gitcall::invoke::failed))]
    Failed {
        /// Rendered command line for diagnostics.
        command: String,
        /// The child's exit status.
        status: i32,
        /// Captured stderr text.
        stderr: String,
    },

    /// A scoped environment override was mutated from outside during its
    /// window. Fatal: it signals unsafe concurrent use of process-wide
    /// environment state and is never retried automatically.
    #[error("environment variable '{variable}' changed during a scoped override")]
    #[diagnostic(
        code(gitcall::invoke::env_tampered),
        help("serialise calls that override '{variable}'; the engine provides no cross-call locking")
    )]
    EnvironmentTampered {
        /// The overridden variable.
        variable: String,
        /// The value the override installed.
        expected: String,
        /// The value observed at restore time, if any.
        found: Option<String>,
    },

    /// An unexpected I/O fault while driving the child.
    #[error("i/o failure while running '{command}'")]
    #[diagnostic(code(gitcall::invoke::io))]
    Io {
        /// Rendered command line for diagnostics.
        command: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}
