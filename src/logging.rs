//! Deep display form for error chains.
//!
//! [`DisplayLog`] borrows an error and writes an inspect-style rendering of
//! it and every cause below it:
//!
//! ```text
//! RandomFailError: failure message
//!     0: std::backtrace::Backtrace::capture
//!     ...
//!  {
//!   code: 'E_RANDOM_FAIL',
//!   rawMessage: '%s',
//!   data: [ 'failure message' ],
//!   innerError: Error: fail
//!       [no backtrace captured]
//!    {
//!     code: 'inner_code'
//!   }
//! }
//! ```
//!
//! Stacks are only present when capture is enabled (`RUST_BACKTRACE` or
//! `RUST_LIB_BACKTRACE`); otherwise a marker line stands in for them.
//!
//! Every individual field is bounded to [`MAX_FIELD_OUTPUT_LEN`] bytes, cut
//! at a UTF-8 boundary and marked with [`TRUNCATION_INDICATOR`].

use crate::ErrorLike;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt::{self, Write as _};

/// Maximum length for any individual field in display output.
pub const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Truncation indicator appended to truncated fields.
pub const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Marker written in place of a stack when none was captured.
pub const NO_BACKTRACE_MARKER: &str = "[no backtrace captured]";

const INDENT_STEP: usize = 2;
const STACK_INDENT: usize = 4;

/// Borrowed display record for one error and its causes.
///
/// Cannot outlive the error it renders.
///
/// ```rust
/// use service_errors::{args, Definition, DisplayLog, GenericError, ServiceError};
///
/// static E_WRAP: Definition = Definition::const_new("E_WRAP", "WrapError", "%s");
///
/// let err = ServiceError::new(&E_WRAP, args![GenericError::new("fail"), "outer"]);
/// let mut out = String::new();
/// DisplayLog::new(&err).write_to(&mut out).unwrap();
///
/// assert!(out.starts_with("WrapError: outer\n"));
/// assert!(out.contains("code: 'E_WRAP'"));
/// assert!(out.contains("innerError: Error: fail"));
/// ```
#[derive(Clone, Copy)]
pub struct DisplayLog<'a> {
    error: &'a dyn ErrorLike,
}

enum Entry<'a> {
    Text(Cow<'a, str>),
    Error(&'a dyn ErrorLike),
}

impl<'a> DisplayLog<'a> {
    /// Borrow `error` for rendering.
    #[inline]
    pub fn new(error: &'a dyn ErrorLike) -> Self {
        Self { error }
    }

    /// The error being rendered.
    #[inline]
    pub fn error(&self) -> &'a dyn ErrorLike {
        self.error
    }

    /// Write the full rendering without building an intermediate string.
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write_error(f, self.error, 0)
    }
}

impl fmt::Display for DisplayLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

impl fmt::Debug for DisplayLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayLog")
            .field("error", &self.error.error_name())
            .finish()
    }
}

fn write_error(f: &mut impl fmt::Write, error: &dyn ErrorLike, indent: usize) -> fmt::Result {
    write!(
        f,
        "{}: {}",
        truncate_with_indicator(&error.error_name()),
        truncate_with_indicator(&error.error_message())
    )?;

    let stack_pad = indent + STACK_INDENT;
    match error.stack() {
        Some(stack) => {
            for line in stack.lines().map(str::trim).filter(|line| !line.is_empty()) {
                write!(f, "\n{:stack_pad$}{}", "", truncate_with_indicator(line))?;
            }
        }
        None => write!(f, "\n{:stack_pad$}{NO_BACKTRACE_MARKER}", "")?,
    }

    let entries = entries(error);
    if entries.is_empty() {
        return Ok(());
    }

    let field_pad = indent + INDENT_STEP;
    f.write_str("\n")?;
    write!(f, "{:indent$} {{", "")?;
    for (i, (key, entry)) in entries.iter().enumerate() {
        if i > 0 {
            f.write_char(',')?;
        }
        write!(f, "\n{:field_pad$}{key}: ", "")?;
        match entry {
            Entry::Text(text) => f.write_str(text)?,
            Entry::Error(inner) => write_error(f, *inner, field_pad)?,
        }
    }
    write!(f, "\n{:indent$}}}", "")
}

fn entries(error: &dyn ErrorLike) -> Vec<(Cow<'_, str>, Entry<'_>)> {
    let mut entries = Vec::new();

    match error.as_service_error() {
        Some(typed) => {
            entries.push((Cow::Borrowed("code"), Entry::Text(quoted(typed.code()))));
            entries.push((Cow::Borrowed("rawMessage"), Entry::Text(quoted(typed.raw_message()))));
            entries.push((Cow::Borrowed("data"), Entry::Text(field(&Value::from(typed.data())))));
            if let Some(inner) = typed.inner_error() {
                entries.push((Cow::Borrowed("innerError"), Entry::Error(inner.as_ref())));
            }
        }
        None => {
            if let Some(code) = error.error_code() {
                entries.push((Cow::Borrowed("code"), Entry::Text(quoted(code))));
            }
        }
    }

    for (key, value) in error.fields() {
        let key = Cow::Owned(render_key(&key));
        entries.push((key, Entry::Text(field(&value))));
    }

    entries
}

fn quoted(s: &str) -> Cow<'static, str> {
    Cow::Owned(truncate_with_indicator(&render_string(s)).into_owned())
}

fn field(value: &Value) -> Cow<'static, str> {
    let mut out = String::new();
    render_value(&mut out, value);
    Cow::Owned(truncate_with_indicator(&out).into_owned())
}

// ============================================================================
// Inspect-Style Value Rendering
// ============================================================================

/// Render a JSON value on one line: `'text'`, `[ a, b ]`, `{ key: v }`.
pub fn render_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(&render_string(s)),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[ ");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_value(out, item);
            }
            out.push_str(" ]");
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{ ");
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&render_key(key));
                out.push_str(": ");
                render_value(out, item);
            }
            out.push_str(" }");
        }
        scalar => {
            // Null, booleans and numbers share their JSON spelling.
            let _ = write!(out, "{scalar}");
        }
    }
}

fn render_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

fn render_key(key: &str) -> String {
    let mut chars = key.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    if is_identifier {
        key.to_owned()
    } else {
        render_string(key)
    }
}

/// Truncate a field for display.
///
/// If the string exceeds [`MAX_FIELD_OUTPUT_LEN`], it's cut at the last
/// UTF-8 boundary that leaves room for [`TRUNCATION_INDICATOR`].
///
/// Returns a `Cow<str>` to avoid allocation when no truncation is needed.
pub fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    if s.len() <= MAX_FIELD_OUTPUT_LEN {
        return Cow::Borrowed(s);
    }

    let max_content_len = MAX_FIELD_OUTPUT_LEN.saturating_sub(TRUNCATION_INDICATOR.len());

    let mut idx = max_content_len;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}
