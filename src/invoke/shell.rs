//! The shell execution strategy.
//!
//! Used when direct spawning is unavailable or a shell pipeline was
//! requested. The whole call — environment assignments, program path,
//! git-dir flag, command, options, positionals — collapses into one escaped
//! command line handed to the intermediary shell. A trailing pipeline
//! suffix, when present, is appended verbatim: it is the caller's requested
//! downstream plumbing, not argument data. Guarded mode applies the same
//! deadline and byte budget as the direct strategy; wild mode (both bounds
//! explicitly disabled) applies none.

use std::process::{Command, Stdio};

use camino::Utf8Path;
use indexmap::IndexMap;
use itertools::Itertools;

use super::{
    builder::{self, CallOptions},
    error::CallError,
    execution::{self, PreparedCall},
    quote::{QuoteError, quote},
    result::CallOutput,
};

#[cfg(windows)]
pub(super) const SHELL: &str = "cmd";
#[cfg(windows)]
pub(super) const SHELL_ARGS: &[&str] = &["/C"];

#[cfg(not(windows))]
pub(super) const SHELL: &str = "sh";
#[cfg(not(windows))]
pub(super) const SHELL_ARGS: &[&str] = &["-c"];

/// Everything needed to compose one shell command line.
pub(super) struct ShellCall<'a> {
    pub(super) program: &'a Utf8Path,
    pub(super) git_dir: Option<&'a Utf8Path>,
    pub(super) env: &'a IndexMap<String, String>,
    pub(super) pipeline: Option<&'a str>,
}

/// Compose the escaped command line for `command` under `shell`.
pub(super) fn compose_line(
    shell: &ShellCall<'_>,
    command: &str,
    options: &CallOptions,
    args: &[String],
) -> Result<String, QuoteError> {
    let mut pieces = Vec::new();
    #[cfg(not(windows))]
    for (key, value) in shell.env {
        pieces.push(format!("{key}={}", quote(value)?));
    }
    pieces.push(quote(shell.program.as_str())?);
    if let Some(dir) = shell.git_dir {
        pieces.push(quote(&format!("--git-dir={dir}"))?);
    }
    pieces.push(builder::shell_form(command, options, args)?);
    if let Some(suffix) = shell.pipeline {
        pieces.push(suffix.to_owned());
    }
    Ok(pieces.iter().join(" "))
}

/// Execute the composed `line` through the intermediary shell.
///
/// On POSIX the environment overrides already ride in the line as
/// assignment prefixes; they are applied to the shell's own environment as
/// well so subshells and pipeline stages observe them too.
pub(super) fn run_shell(
    line: &str,
    env: &IndexMap<String, String>,
    cwd: Option<&Utf8Path>,
    call: PreparedCall,
) -> Result<CallOutput, CallError> {
    let mut shell = Command::new(SHELL);
    shell
        .args(SHELL_ARGS)
        .arg(line)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in env {
        shell.env(key, value);
    }
    if let Some(dir) = cwd {
        shell.current_dir(dir.as_std_path());
    }
    execution::run_child(shell, call)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_call<'a>(
        program: &'a Utf8Path,
        env: &'a IndexMap<String, String>,
    ) -> ShellCall<'a> {
        ShellCall {
            program,
            git_dir: None,
            env,
            pipeline: None,
        }
    }

    #[cfg(not(windows))]
    #[test]
    fn compose_line_orders_env_program_command_and_suffix() {
        let env = IndexMap::from([("GIT_SSH".to_owned(), "ssh -v".to_owned())]);
        let mut call = shell_call(Utf8Path::new("/usr/bin/git"), &env);
        let git_dir = Utf8Path::new("/repo/.git");
        call.git_dir = Some(git_dir);
        call.pipeline = Some("| wc -l");

        let line = compose_line(&call, "rev-list", &CallOptions::new(), &["master".to_owned()])
            .expect("line should compose");

        assert!(line.starts_with("GIT_SSH="), "line: {line}");
        assert!(line.ends_with("| wc -l"), "line: {line}");
        let env_free = line
            .split_once(' ')
            .map(|(_, rest)| rest.to_owned())
            .expect("line has pieces");
        assert!(env_free.contains("rev-list"), "line: {line}");
        assert!(env_free.contains("--git-dir"), "line: {line}");
    }

    #[cfg(not(windows))]
    #[test]
    fn compose_line_quotes_hostile_positionals() {
        let env = IndexMap::new();
        let call = shell_call(Utf8Path::new("git"), &env);
        let line = compose_line(
            &call,
            "log",
            &CallOptions::new(),
            &["$(reboot)".to_owned()],
        )
        .expect("line should compose");
        let words = shlex::split(&line).expect("line should split");
        assert_eq!(words, vec!["git".to_owned(), "log".to_owned(), "$(reboot)".to_owned()]);
    }
}
