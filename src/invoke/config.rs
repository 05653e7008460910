//! Engine-wide defaults and per-call configuration.
//!
//! The engine-wide values are an explicit configuration value constructed at
//! startup and handed to each call by reference, never ambient global state;
//! tests build independent configurations without cross-test interference.
//! A call resolves its effective timeout and output cap once at call start,
//! and those values are fixed for the call's lifetime even if the defaults
//! are changed concurrently.

use std::{fmt, time::Duration};

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

use super::capability::SpawnCapability;
use crate::locate;

/// Default wall-clock budget for a single call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default cumulative byte budget across a call's stdout and stderr.
pub const DEFAULT_OUTPUT_CAP: u64 = 5 * 1024 * 1024;

/// Process-wide engine defaults, resolved once and shared across calls.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    program: Utf8PathBuf,
    git_dir: Utf8PathBuf,
    default_timeout: Duration,
    output_cap: u64,
    capability: SpawnCapability,
}

impl EngineConfig {
    /// Build a configuration for the repository whose git directory is
    /// `git_dir`, resolving the git binary through [`locate::git_program`].
    #[must_use]
    pub fn new(git_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            program: locate::git_program().to_path_buf(),
            git_dir: git_dir.into(),
            default_timeout: DEFAULT_TIMEOUT,
            output_cap: DEFAULT_OUTPUT_CAP,
            capability: SpawnCapability::default(),
        }
    }

    /// Override the resolved git executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<Utf8PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Override the default per-call timeout.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Override the default cumulative output cap in bytes.
    #[must_use]
    pub fn with_output_cap(mut self, bytes: u64) -> Self {
        self.output_cap = bytes;
        self
    }

    /// Path of the git executable this engine invokes.
    #[must_use]
    pub fn program(&self) -> &Utf8Path {
        self.program.as_path()
    }

    /// Path of the target git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Utf8Path {
        self.git_dir.as_path()
    }

    /// Default per-call timeout.
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Default cumulative output cap in bytes.
    #[must_use]
    pub const fn output_cap(&self) -> u64 {
        self.output_cap
    }

    pub(super) const fn capability(&self) -> &SpawnCapability {
        &self.capability
    }
}

/// Per-call timeout selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeoutSpec {
    /// Use the engine's default timeout.
    #[default]
    Default,
    /// Enforce this deadline instead; a zero duration disables the deadline.
    After(Duration),
    /// Enforce no deadline.
    Disabled,
}

impl TimeoutSpec {
    pub(super) fn resolve(self, config: &EngineConfig) -> Option<Duration> {
        match self {
            Self::Default => Some(config.default_timeout()),
            Self::After(limit) if !limit.is_zero() => Some(limit),
            Self::After(_) | Self::Disabled => None,
        }
    }
}

/// Per-call output-cap selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapSpec {
    /// Use the engine's default cap.
    #[default]
    Default,
    /// Enforce this cumulative byte budget instead.
    Bytes(u64),
    /// Enforce no cap at all.
    Unlimited,
}

impl CapSpec {
    pub(super) fn resolve(self, config: &EngineConfig) -> Option<u64> {
        match self {
            Self::Default => Some(config.output_cap()),
            Self::Bytes(limit) => Some(limit),
            Self::Unlimited => None,
        }
    }
}

/// Input payload for the child's stdin.
pub enum CallInput {
    /// A payload already in memory.
    Bytes(Vec<u8>),
    /// A producer invoked once at call start to materialise the payload.
    Producer(Box<dyn FnOnce() -> Vec<u8> + Send>),
}

impl CallInput {
    pub(super) fn resolve(self) -> Vec<u8> {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Producer(produce) => produce(),
        }
    }
}

impl fmt::Debug for CallInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl From<Vec<u8>> for CallInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for CallInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<String> for CallInput {
    fn from(text: String) -> Self {
        Self::Bytes(text.into_bytes())
    }
}

impl From<&str> for CallInput {
    fn from(text: &str) -> Self {
        Self::Bytes(text.as_bytes().to_vec())
    }
}

/// Per-call settings, consumed by exactly one call.
#[derive(Debug, Default)]
pub struct CallConfig {
    pub(super) timeout: TimeoutSpec,
    pub(super) cap: CapSpec,
    pub(super) base: Base,
    pub(super) env: IndexMap<String, String>,
    pub(super) raise: bool,
    pub(super) input: Option<CallInput>,
    pub(super) pipeline: bool,
}

/// Whether the target git directory is passed to the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Base(pub(super) bool);

impl Default for Base {
    fn default() -> Self {
        Self(true)
    }
}

impl CallConfig {
    /// Select the call's timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: TimeoutSpec) -> Self {
        self.timeout = timeout;
        self
    }

    /// Select the call's cumulative output cap.
    #[must_use]
    pub fn with_cap(mut self, cap: CapSpec) -> Self {
        self.cap = cap;
        self
    }

    /// Control whether the target git directory flag is passed (default
    /// true).
    #[must_use]
    pub fn with_base(mut self, base: bool) -> Self {
        self.base = Base(base);
        self
    }

    /// Add an environment override applied only for this call's duration.
    #[must_use]
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Raise [`super::CallError::Failed`] on a non-zero exit instead of
    /// returning the result (default false).
    #[must_use]
    pub fn with_raise(mut self, raise: bool) -> Self {
        self.raise = raise;
        self
    }

    /// Supply the child's stdin payload.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<CallInput>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Explicitly request execution through a shell pipeline.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: bool) -> Self {
        self.pipeline = pipeline;
        self
    }
}
