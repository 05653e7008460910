//! Probe for direct process-spawn support.
//!
//! Computed at most once per engine configuration by spawning a trivial
//! child and waiting on it; any failure is recorded as `false` for the
//! configuration's lifetime. The platform capability cannot change at
//! runtime, so subsequent calls route to their strategy with no further
//! probing.

use std::{
    process::{Command, Stdio},
    sync::OnceLock,
};

use super::shell::{SHELL, SHELL_ARGS};

/// Cached answer to "can this host spawn children directly?".
#[derive(Debug, Clone, Default)]
pub(crate) struct SpawnCapability {
    probed: OnceLock<bool>,
}

impl SpawnCapability {
    pub(crate) fn direct_spawn_supported(&self) -> bool {
        *self.probed.get_or_init(probe_direct_spawn)
    }
}

fn probe_direct_spawn() -> bool {
    let mut trivial = Command::new(SHELL);
    trivial
        .args(SHELL_ARGS)
        .arg("exit 0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    match trivial.spawn() {
        Ok(mut child) => child.wait().is_ok(),
        Err(err) => {
            tracing::debug!(%err, "direct spawn probe failed; using shell strategy");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn probe_reports_direct_spawn_on_unix() {
        let capability = SpawnCapability::default();
        assert!(capability.direct_spawn_supported());
        // Second query hits the cache and agrees with the first.
        assert!(capability.direct_spawn_supported());
    }
}
