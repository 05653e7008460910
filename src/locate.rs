//! Resolution of the git executable.
//!
//! The binary is located once per process: an explicit [`GIT_PROGRAM_ENV`]
//! override wins, otherwise the first executable `git` on `PATH` is used,
//! falling back to the bare program name so the OS loader gets a final say.
//! The result is cached for the life of the process; engine configurations
//! copy it at construction time.

use std::{
    env,
    ffi::OsString,
    path::PathBuf,
    sync::OnceLock,
};

use camino::{Utf8Path, Utf8PathBuf};
use git_env::GIT_PROGRAM_ENV;

/// Default program name used when no override or `PATH` hit exists.
pub const GIT_PROGRAM: &str = "git";

static RESOLVED: OnceLock<Utf8PathBuf> = OnceLock::new();

/// Resolve the git executable, caching the answer for the process lifetime.
#[must_use]
pub fn git_program() -> &'static Utf8Path {
    RESOLVED
        .get_or_init(|| resolve_git_program_with(|key| env::var_os(key)))
        .as_path()
}

fn resolve_git_program_with<F>(mut read_env: F) -> Utf8PathBuf
where
    F: FnMut(&str) -> Option<OsString>,
{
    if let Some(value) = read_env(GIT_PROGRAM_ENV)
        && let Ok(path) = Utf8PathBuf::from_path_buf(PathBuf::from(value))
    {
        return path;
    }
    search_path(read_env("PATH")).unwrap_or_else(|| Utf8PathBuf::from(GIT_PROGRAM))
}

fn search_path(raw: Option<OsString>) -> Option<Utf8PathBuf> {
    let raw_value = raw?;
    for entry in env::split_paths(&raw_value) {
        if entry.as_os_str().is_empty() {
            continue;
        }
        let Ok(dir) = Utf8PathBuf::from_path_buf(entry) else {
            continue;
        };
        for name in candidate_names() {
            let candidate = dir.join(name);
            if is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(windows)]
fn candidate_names() -> &'static [&'static str] {
    &["git.exe", "git.cmd", "git.bat"]
}

#[cfg(not(windows))]
fn candidate_names() -> &'static [&'static str] {
    &[GIT_PROGRAM]
}

#[cfg(unix)]
fn is_executable(path: &Utf8Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path.as_std_path())
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Utf8Path) -> bool {
    path.as_std_path().is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_prefers_env_override() {
        let resolved = resolve_git_program_with(|key| {
            (key == GIT_PROGRAM_ENV).then(|| OsString::from("/opt/git/bin/git"))
        });
        assert_eq!(resolved, Utf8PathBuf::from("/opt/git/bin/git"));
    }

    #[test]
    fn resolver_falls_back_to_bare_name() {
        let resolved = resolve_git_program_with(|_| None);
        assert_eq!(resolved, Utf8PathBuf::from(GIT_PROGRAM));
    }

    #[cfg(unix)]
    #[test]
    fn resolver_ignores_invalid_utf8_override() {
        use std::os::unix::ffi::OsStringExt;

        let resolved = resolve_git_program_with(|key| {
            (key == GIT_PROGRAM_ENV)
                .then(|| OsString::from_vec(vec![0xff, b'g', b'i', b't']))
        });
        assert_eq!(resolved, Utf8PathBuf::from(GIT_PROGRAM));
    }

    #[cfg(unix)]
    #[test]
    fn search_path_finds_executable_entries() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(GIT_PROGRAM);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").expect("script");
        let mut perms = std::fs::metadata(&path).expect("meta").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("perms");

        let resolved = search_path(Some(OsString::from(dir.path())))
            .expect("executable should be found");
        assert_eq!(resolved.as_std_path(), path.as_path());
    }

    #[cfg(unix)]
    #[test]
    fn search_path_skips_non_executable_entries() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join(GIT_PROGRAM), "not a program").expect("file");
        assert_eq!(search_path(Some(OsString::from(dir.path()))), None);
    }
}
