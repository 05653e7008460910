//! Platform-aware quoting for shell-form command strings.
//!
//! Quoting turns every metacharacter — quotes, semicolons, pipes,
//! redirections — into a literal, so a composed command line can never grow
//! extra shell commands out of argument data. Arguments containing line
//! breaks are rejected outright: no supported shell can carry them safely
//! inside a single token.

use thiserror::Error;

#[cfg(not(windows))]
use shell_quote::{QuoteRefExt, Sh};

/// Failure to produce a safe quoted token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// The argument contains a carriage return or line feed.
    #[error("arguments containing carriage returns or line feeds cannot be safely quoted")]
    ContainsLineBreak,
}

fn reject_line_breaks(arg: &str) -> Result<(), QuoteError> {
    if arg.chars().any(|ch| matches!(ch, '\n' | '\r')) {
        return Err(QuoteError::ContainsLineBreak);
    }
    Ok(())
}

/// Quote `arg` for the platform shell (`sh` here).
#[cfg(not(windows))]
pub(super) fn quote(arg: &str) -> Result<String, QuoteError> {
    reject_line_breaks(arg)?;
    let bytes = arg.quoted(Sh);
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            debug_assert!(false, "quoted args must be valid UTF-8: {err}");
            Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
        }
    }
}

/// Quote `arg` for the platform shell (`cmd.exe` here).
///
/// `cmd.exe` has no off-the-shelf quoting crate; this escapes the
/// metacharacters `^ & | < > % !` and embedded double quotes per the
/// `CommandLineToArgvW` splitting rules, wrapping the token in double quotes
/// when any of them (or whitespace) is present.
#[cfg(windows)]
pub(super) fn quote(arg: &str) -> Result<String, QuoteError> {
    reject_line_breaks(arg)?;

    if arg.is_empty() {
        return Ok("\"\"".to_owned());
    }

    let needs_quotes = arg.chars().any(|ch| {
        matches!(
            ch,
            ' ' | '\t' | '"' | '^' | '&' | '|' | '<' | '>' | '%' | '!' | ';'
        )
    });
    if !needs_quotes {
        return Ok(arg.to_owned());
    }

    let mut buf = String::with_capacity(arg.len() + 2);
    buf.push('"');
    for ch in arg.chars() {
        match ch {
            '"' | '^' | '&' | '|' | '<' | '>' | '!' => {
                buf.push('^');
                buf.push(ch);
            }
            '%' => {
                buf.push('%');
                buf.push('%');
            }
            _ => buf.push(ch),
        }
    }
    buf.push('"');
    Ok(buf)
}
