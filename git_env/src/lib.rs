#![forbid(unsafe_code)]

//! Shared environment constants used across gitcall crates (library, tests,
//! and helpers).

/// Environment variable override for the git executable.
///
/// # Examples
///
/// ```
/// use git_env::GIT_PROGRAM_ENV;
/// assert_eq!(GIT_PROGRAM_ENV, "GITCALL_GIT");
/// ```
pub const GIT_PROGRAM_ENV: &str = "GITCALL_GIT";

/// Index-file redirect variable read by git itself.
///
/// Pointing this at a scratch path lets a sequence of calls stage and write
/// trees against a disposable index instead of the repository's own.
///
/// # Examples
///
/// ```
/// use git_env::GIT_INDEX_ENV;
/// assert_eq!(GIT_INDEX_ENV, "GIT_INDEX_FILE");
/// ```
pub const GIT_INDEX_ENV: &str = "GIT_INDEX_FILE";
