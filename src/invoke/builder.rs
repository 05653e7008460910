//! Translation of structured call descriptions into argument forms.
//!
//! A call is a command name, an insertion-ordered option mapping, and a
//! sequence of positional arguments. The direct-exec form is a token vector
//! handed straight to process creation with no escaping; the shell form is a
//! single escaped string safe to hand to `sh -c`. Option order is part of the
//! contract: several git commands are order-sensitive, so the mapping's
//! iteration order is preserved verbatim.

use indexmap::IndexMap;
use itertools::Itertools;

use super::quote::{QuoteError, quote};

/// Insertion-ordered option mapping for a single call.
pub type CallOptions = IndexMap<String, OptionValue>;

/// Value attached to an option key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// `true` emits the bare flag; `false` emits nothing at all.
    Flag(bool),
    /// A textual value following the flag.
    Text(String),
    /// A numeric value following the flag.
    Number(i64),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

fn is_short(key: &str) -> bool {
    key.chars().count() == 1
}

/// Derive the flag token for `key`: single-character keys become short
/// flags, longer keys become long flags with underscores turned into dashes.
fn flag_token(key: &str) -> String {
    if is_short(key) {
        format!("-{key}")
    } else {
        format!("--{}", key.replace('_', "-"))
    }
}

/// Build the direct-exec argument vector: command name, options in insertion
/// order, then positionals in the given order. No escaping is applied; the
/// tokens go straight to process creation.
#[must_use]
pub fn argv_form(command: &str, options: &CallOptions, args: &[String]) -> Vec<String> {
    let mut tokens = vec![command.to_owned()];
    for (key, value) in options {
        push_direct(&mut tokens, key, value);
    }
    tokens.extend(args.iter().cloned());
    tokens
}

fn push_direct(tokens: &mut Vec<String>, key: &str, value: &OptionValue) {
    let flag = flag_token(key);
    match value {
        OptionValue::Flag(false) => {}
        OptionValue::Flag(true) => tokens.push(flag),
        OptionValue::Text(text) => push_direct_valued(tokens, key, flag, text),
        OptionValue::Number(number) => {
            push_direct_valued(tokens, key, flag, &number.to_string());
        }
    }
}

fn push_direct_valued(tokens: &mut Vec<String>, key: &str, flag: String, value: &str) {
    if is_short(key) {
        tokens.push(flag);
        tokens.push(value.to_owned());
    } else {
        tokens.push(format!("{flag}={value}"));
    }
}

/// Build the escaped shell-form command string. Flag derivation matches
/// [`argv_form`]; values and positionals are individually quoted, and valued
/// long flags embed `=value` inside the quoted token.
///
/// # Errors
///
/// Returns [`QuoteError`] when an argument cannot be quoted safely.
pub fn shell_form(
    command: &str,
    options: &CallOptions,
    args: &[String],
) -> Result<String, QuoteError> {
    let mut tokens = vec![command.to_owned()];
    for (key, value) in options {
        push_shell(&mut tokens, key, value)?;
    }
    for arg in args {
        tokens.push(quote(arg)?);
    }
    Ok(tokens.iter().join(" "))
}

fn push_shell(tokens: &mut Vec<String>, key: &str, value: &OptionValue) -> Result<(), QuoteError> {
    let flag = flag_token(key);
    match value {
        OptionValue::Flag(false) => {}
        OptionValue::Flag(true) => tokens.push(flag),
        OptionValue::Text(text) => push_shell_valued(tokens, key, flag, text)?,
        OptionValue::Number(number) => {
            push_shell_valued(tokens, key, flag, &number.to_string())?;
        }
    }
    Ok(())
}

fn push_shell_valued(
    tokens: &mut Vec<String>,
    key: &str,
    flag: String,
    value: &str,
) -> Result<(), QuoteError> {
    if is_short(key) {
        tokens.push(flag);
        tokens.push(quote(value)?);
    } else {
        tokens.push(quote(&format!("{flag}={value}"))?);
    }
    Ok(())
}
