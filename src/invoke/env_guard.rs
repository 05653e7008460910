//! Scoped override of a process-wide environment variable.
//!
//! The override window is the one genuinely unsafe-to-share resource in
//! this engine: two concurrent calls needing different values for the same
//! variable would race. Callers composing multi-step workflows must
//! serialise the steps themselves; the engine detects (rather than
//! prevents) concurrent mutation and reports it as a fatal error.

use std::env;

use super::error::CallError;

/// Run `body` with `key` set to `value`, restoring the prior value
/// afterwards.
///
/// Before restoring, the current value is compared with the override; any
/// mismatch means something else mutated the variable inside the scoped
/// window, and [`CallError::EnvironmentTampered`] is raised. The prior
/// value is restored even on that path.
///
/// # Errors
///
/// Returns `body`'s error, or [`CallError::EnvironmentTampered`] when the
/// variable was mutated during the window; the tamper error takes
/// precedence.
pub fn with_override<T, F>(key: &str, value: &str, body: F) -> Result<T, CallError>
where
    F: FnOnce() -> Result<T, CallError>,
{
    let prior = env::var_os(key);
    // SAFETY: mutating the process environment is unsound only under
    // concurrent access; this window's single-threaded-use contract is
    // documented above, and violations are surfaced as tamper errors.
    unsafe { env::set_var(key, value) };

    let outcome = body();

    let observed = env::var(key).ok();
    let tampered = observed.as_deref() != Some(value);

    // SAFETY: as above; restores the variable to its pre-override state.
    unsafe {
        match &prior {
            Some(previous) => env::set_var(key, previous),
            None => env::remove_var(key),
        }
    }

    if tampered {
        return Err(CallError::EnvironmentTampered {
            variable: key.to_owned(),
            expected: value.to_owned(),
            found: observed,
        });
    }
    outcome
}
