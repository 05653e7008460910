//! Gitcall core library.
//!
//! A bounded subprocess engine for driving the `git` command line. The
//! engine turns structured call descriptions into argument vectors or
//! escaped shell command strings, executes them under wall-clock and
//! output-size bounds, and guarantees that every child process is reaped
//! and every pipe descriptor closed on every exit path.
//!
//! Layers above this crate interpret git's raw output; this crate only
//! promises to return it byte-for-byte.

pub mod invoke;
pub mod locate;
