//! Test utilities for driving the engine against fake git executables.
//!
//! Each helper builds a small shell script in a temporary directory and
//! hands back both the directory guard and the script path; dropping the
//! guard removes the fake binary.

#![allow(dead_code, reason = "helpers are shared across test crates")]

use std::fs::{self, File};
use std::io::Write;

use camino::Utf8PathBuf;
use gitcall::invoke::{Engine, EngineConfig};
use tempfile::TempDir;

/// Create a fake git executable that runs `body` as a shell script.
///
/// Returns the temporary directory and the path to the executable.
pub fn fake_git_script(body: &str) -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("git");
    let mut file = File::create(&path).expect("script");
    writeln!(file, "#!/bin/sh\n{body}").expect("write script");
    drop(file);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path).expect("meta").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("perms");
    }
    let path = Utf8PathBuf::from_path_buf(path).expect("temp path should be UTF-8");
    (dir, path)
}

/// Create a fake git executable that exits with `exit_code`.
pub fn fake_git(exit_code: i32) -> (TempDir, Utf8PathBuf) {
    fake_git_script(&format!("exit {exit_code}"))
}

/// Build an engine whose git binary is `program`.
///
/// The git directory is a placeholder; tests that assert on the
/// `--git-dir` flag build their own configuration.
pub fn engine_for(program: impl Into<Utf8PathBuf>) -> Engine {
    Engine::new(EngineConfig::new("/tmp/gitcall-tests/.git").with_program(program))
}
