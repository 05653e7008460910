//! Bounded invocation of the git command line.
//!
//! The engine turns a structured call description — command name,
//! insertion-ordered options, positional arguments, per-call configuration —
//! into a running child process, captures its output, and returns it
//! byte-for-byte. Two strategies exist: direct process creation, and an
//! escaped command line through an intermediary shell. The shell strategy is
//! chosen when the capability probe reports no direct-spawn support, when a
//! call explicitly requests a pipeline, or when its final positional token
//! begins with `|` (long-standing caller shorthand for a pipeline, kept for
//! compatibility).
//!
//! # Output limits
//!
//! Every guarded call runs under a wall-clock deadline and a cumulative
//! byte budget across stdout and stderr. Violating either kills and reaps
//! the child, closes every pipe, and raises [`CallError::Timeout`] with the
//! bytes read so far; cleanup is a hard guarantee, not best-effort.
//!
//! # Concurrency
//!
//! Calls are independent: each owns its child, its pipes, and its bounds,
//! so one call's abort never disturbs another. The single exception is the
//! scoped environment override used by [`Engine::invoke_raw`]; overlapping
//! overrides of the same variable are unsafe and detected as
//! [`CallError::EnvironmentTampered`].
//!
//! # Security
//!
//! Shell-strategy command lines quote every value and positional argument,
//! so quotes, semicolons, and other metacharacters in argument data stay
//! literal. A trailing pipeline suffix is the one deliberately unquoted
//! piece: it is the caller's own plumbing, and callers must not place
//! untrusted input there. Logged command lines are credential-redacted.

mod builder;
mod capability;
mod config;
pub mod env_guard;
mod error;
mod execution;
mod pipes;
mod quote;
mod redact;
mod result;
mod shell;
mod stdin;

pub use builder::{CallOptions, OptionValue, argv_form, shell_form};
pub use config::{
    CallConfig, CallInput, CapSpec, DEFAULT_OUTPUT_CAP, DEFAULT_TIMEOUT, EngineConfig, TimeoutSpec,
};
pub use error::{AbortCause, CallError};
pub use quote::QuoteError;
pub use result::CallOutput;

use camino::Utf8Path;

use execution::PreparedCall;
use shell::ShellCall;

/// The subprocess engine: engine-wide defaults plus the call entry points.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Build an engine around `config`.
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The engine-wide configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mutable access to the engine-wide defaults. Calls already in flight
    /// keep the values they resolved at call start.
    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    /// Invoke `command` and return its raw standard output bytes.
    ///
    /// # Errors
    ///
    /// See [`Engine::execute`]; the result is discarded apart from stdout.
    pub fn invoke(
        &self,
        command: &str,
        options: &CallOptions,
        args: &[String],
        call: CallConfig,
    ) -> Result<Vec<u8>, CallError> {
        self.execute(command, options, args, call)
            .map(|output| output.stdout)
    }

    /// Invoke `command` and return the full captured result.
    ///
    /// # Errors
    ///
    /// [`CallError::Timeout`] when the deadline or byte budget is violated,
    /// [`CallError::Failed`] when strict mode was requested and the child
    /// exited non-zero, and [`CallError::Io`] on unexpected faults.
    pub fn execute(
        &self,
        command: &str,
        options: &CallOptions,
        args: &[String],
        call: CallConfig,
    ) -> Result<CallOutput, CallError> {
        self.execute_at(command, options, args, call, None)
    }

    /// Invoke `command` against an alternate index file, pinning the child's
    /// working directory to `work_dir`.
    ///
    /// The index override is applied through a scoped process-environment
    /// window; callers chaining several calls over one scratch index must
    /// serialise them.
    ///
    /// # Errors
    ///
    /// As [`Engine::execute`], plus [`CallError::EnvironmentTampered`] when
    /// the override window was mutated concurrently.
    pub fn invoke_raw(
        &self,
        command: &str,
        options: &CallOptions,
        args: &[String],
        index_file: &Utf8Path,
        work_dir: &Utf8Path,
        call: CallConfig,
    ) -> Result<CallOutput, CallError> {
        env_guard::with_override(git_env::GIT_INDEX_ENV, index_file.as_str(), || {
            self.execute_at(command, options, args, call, Some(work_dir))
        })
    }

    fn execute_at(
        &self,
        command: &str,
        options: &CallOptions,
        args: &[String],
        call: CallConfig,
        cwd: Option<&Utf8Path>,
    ) -> Result<CallOutput, CallError> {
        let CallConfig {
            timeout,
            cap,
            base,
            env,
            raise,
            input,
            pipeline,
        } = call;

        let deadline = timeout.resolve(&self.config);
        let cap = cap.resolve(&self.config);
        let input = input.map(CallInput::resolve);
        let git_dir = base.0.then(|| self.config.git_dir());

        let (body_args, pipe_suffix): (&[String], Option<&str>) = match args.split_last() {
            Some((last, head)) if last.starts_with('|') => (head, Some(last.as_str())),
            _ => (args, None),
        };
        let use_shell = pipeline
            || pipe_suffix.is_some()
            || !self.config.capability().direct_spawn_supported();

        if use_shell {
            let shell_call = ShellCall {
                program: self.config.program(),
                git_dir,
                env: &env,
                pipeline: pipe_suffix,
            };
            let line = shell::compose_line(&shell_call, command, options, body_args)
                .map_err(|err| unquotable(command, err))?;
            tracing::debug!(command = %redact::redact_line(&line), "invoking git via shell");
            let prepared = PreparedCall {
                label: line.clone(),
                input,
                deadline,
                cap,
            };
            let output = shell::run_shell(&line, &env, cwd, prepared)?;
            finish(line, output, raise)
        } else {
            let mut argv = Vec::new();
            if let Some(dir) = git_dir {
                argv.push(format!("--git-dir={dir}"));
            }
            argv.extend(builder::argv_form(command, options, args));
            let label = render_command(self.config.program(), &argv);
            tracing::debug!(command = %redact::redact_line(&label), "invoking git");
            let prepared = PreparedCall {
                label: label.clone(),
                input,
                deadline,
                cap,
            };
            let output =
                execution::run_direct(self.config.program(), &argv, &env, cwd, prepared)?;
            finish(label, output, raise)
        }
    }
}

/// Apply strict-mode semantics to a completed call.
fn finish(label: String, output: CallOutput, raise: bool) -> Result<CallOutput, CallError> {
    if raise && !output.success() {
        return Err(CallError::Failed {
            command: label,
            status: output.status,
            stderr: output.stderr_text(),
        });
    }
    Ok(output)
}

fn render_command(program: &Utf8Path, argv: &[String]) -> String {
    let words: Vec<&str> = std::iter::once(program.as_str())
        .chain(argv.iter().map(String::as_str))
        .collect();
    shlex::try_join(words.iter().copied()).unwrap_or_else(|_| words.join(" "))
}

fn unquotable(command: &str, err: QuoteError) -> CallError {
    CallError::Io {
        command: command.to_owned(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_command_quotes_awkward_arguments() {
        let rendered = render_command(
            Utf8Path::new("/usr/bin/git"),
            &["log".to_owned(), "release branch".to_owned()],
        );
        let words = shlex::split(&rendered).expect("rendered line should split");
        assert_eq!(
            words,
            vec![
                "/usr/bin/git".to_owned(),
                "log".to_owned(),
                "release branch".to_owned()
            ]
        );
    }

    #[test]
    fn finish_raises_only_in_strict_mode() {
        let output = CallOutput {
            stdout: Vec::new(),
            stderr: b"fatal: oops".to_vec(),
            status: 1,
        };
        let relaxed = finish("git status".to_owned(), output.clone(), false)
            .expect("relaxed mode returns the result");
        assert_eq!(relaxed.status, 1);

        match finish("git status".to_owned(), output, true) {
            Err(CallError::Failed { status, stderr, .. }) => {
                assert_eq!(status, 1);
                assert_eq!(stderr, "fatal: oops");
            }
            other => panic!("expected strict failure, got {other:?}"),
        }
    }
}
