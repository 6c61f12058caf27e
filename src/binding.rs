//! Message binding - positional placeholder substitution for templates.
//!
//! Templates use three placeholder tokens:
//!
//! | Token | Rendering                                              |
//! |-------|--------------------------------------------------------|
//! | `%s`  | strings verbatim, numbers in shortest form, else JSON  |
//! | `%d`  | numeric coercion truncated toward zero, else `NaN`     |
//! | `%j`  | compact JSON                                           |
//!
//! `%%` is an escaped percent sign and never counts as a placeholder.
//!
//! `%s` writes whole-valued floats without a fractional part (`1.0` renders
//! as `1`, `-0.0` as `0`). `%j` keeps serde_json's spelling (`1.0`).
//!
//! # Binding Rules
//!
//! - A template with `k` placeholders consumes at most the first `k` arguments
//! - A template without placeholders is returned verbatim and consumes nothing
//! - Zero arguments leave the template verbatim, escapes included
//! - With fewer arguments than placeholders, the trailing placeholders stay
//!   as literal tokens
//!
//! Binding borrows the template and only allocates when a substitution
//! actually happens.
//!
//! # Example
//!
//! ```rust
//! use service_errors::binding::bind_message;
//! use serde_json::json;
//!
//! let binding = bind_message("Fail %s: %d: %j", &[json!("disk"), json!(7.9), json!({"a": 1}), json!("extra")]);
//! assert_eq!(binding.message, "Fail disk: 7: {\"a\":1}");
//! assert_eq!(binding.consumed, 3);
//! ```

use serde_json::Value;
use smallvec::SmallVec;
use std::borrow::Cow;

/// A positional placeholder kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `%s`
    String,
    /// `%d`
    Integer,
    /// `%j`
    Json,
}

impl Placeholder {
    /// The literal token for this placeholder.
    #[inline]
    pub const fn token(self) -> &'static str {
        match self {
            Self::String => "%s",
            Self::Integer => "%d",
            Self::Json => "%j",
        }
    }

    #[inline]
    const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b's' => Some(Self::String),
            b'd' => Some(Self::Integer),
            b'j' => Some(Self::Json),
            _ => None,
        }
    }

    /// Render one argument for this placeholder.
    pub fn render(self, value: &Value) -> Cow<'_, str> {
        match self {
            Self::String => match value {
                Value::String(s) => Cow::Borrowed(s.as_str()),
                Value::Number(n) => Cow::Owned(render_number(n)),
                other => Cow::Owned(other.to_string()),
            },
            Self::Integer => Cow::Owned(render_integer(value)),
            Self::Json => Cow::Owned(value.to_string()),
        }
    }
}

/// Result of binding a template against an argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding<'a> {
    /// Final display message.
    pub message: Cow<'a, str>,
    /// Number of leading arguments substituted into the template.
    pub consumed: usize,
}

#[derive(Debug, Clone, Copy)]
enum TokenKind {
    Placeholder(Placeholder),
    Escape,
}

/// A two-byte token starting at `offset`.
#[derive(Debug, Clone, Copy)]
struct Token {
    offset: usize,
    kind: TokenKind,
}

fn scan(template: &str) -> SmallVec<[Token; 4]> {
    let bytes = template.as_bytes();
    let mut tokens = SmallVec::new();
    let mut idx = 0;

    while idx + 1 < bytes.len() {
        if bytes[idx] != b'%' {
            idx += 1;
            continue;
        }

        let next = bytes[idx + 1];
        if next == b'%' {
            tokens.push(Token { offset: idx, kind: TokenKind::Escape });
            idx += 2;
        } else if let Some(placeholder) = Placeholder::from_byte(next) {
            tokens.push(Token { offset: idx, kind: TokenKind::Placeholder(placeholder) });
            idx += 2;
        } else {
            idx += 1;
        }
    }

    tokens
}

/// Count the placeholder tokens in a template.
pub fn count_placeholders(template: &str) -> usize {
    scan(template)
        .iter()
        .filter(|token| matches!(token.kind, TokenKind::Placeholder(_)))
        .count()
}

/// Substitute the leading arguments into the template's placeholders.
pub fn bind_message<'a>(template: &'a str, args: &[Value]) -> Binding<'a> {
    let tokens = scan(template);
    let placeholders = tokens
        .iter()
        .filter(|token| matches!(token.kind, TokenKind::Placeholder(_)))
        .count();

    if placeholders == 0 || args.is_empty() {
        return Binding {
            message: Cow::Borrowed(template),
            consumed: 0,
        };
    }

    let consumed = placeholders.min(args.len());
    let mut bound = args[..consumed].iter();
    let mut message = String::with_capacity(template.len() + consumed * 8);
    let mut cursor = 0;

    for token in &tokens {
        message.push_str(&template[cursor..token.offset]);
        cursor = token.offset + 2;

        match token.kind {
            TokenKind::Escape => message.push('%'),
            TokenKind::Placeholder(placeholder) => match bound.next() {
                Some(value) => message.push_str(&placeholder.render(value)),
                None => message.push_str(placeholder.token()),
            },
        }
    }
    message.push_str(&template[cursor..]);

    Binding {
        message: Cow::Owned(message),
        consumed,
    }
}

fn render_integer(value: &Value) -> String {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map_or_else(|| String::from("NaN"), render_truncated)
            }
        }
        Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
        Value::Null => String::from("0"),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                String::from("0")
            } else {
                trimmed
                    .parse::<f64>()
                    .map_or_else(|_| String::from("NaN"), render_truncated)
            }
        }
        Value::Array(_) | Value::Object(_) => String::from("NaN"),
    }
}

fn render_number(number: &serde_json::Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() && float.fract() == 0.0 => render_truncated(float),
        _ => number.to_string(),
    }
}

fn render_truncated(number: f64) -> String {
    if number.is_nan() {
        return String::from("NaN");
    }
    if number.is_infinite() {
        return String::from(if number > 0.0 { "Infinity" } else { "-Infinity" });
    }

    let truncated = number.trunc();
    if truncated == 0.0 {
        // no "-0"
        String::from("0")
    } else if truncated.abs() < 9.0e15 {
        (truncated as i64).to_string()
    } else {
        format!("{truncated}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_placeholders_returns_template_verbatim() {
        let binding = bind_message("Something failed", &[json!("ignored"), json!(1)]);
        assert_eq!(binding.message, "Something failed");
        assert_eq!(binding.consumed, 0);
        assert!(matches!(binding.message, Cow::Borrowed(_)));
    }

    #[test]
    fn substitutes_in_order() {
        let binding = bind_message(
            "Fail %s: %d: %j",
            &[json!("string"), json!(0), json!({ "a": 1 }), json!("extra")],
        );
        assert_eq!(binding.message, "Fail string: 0: {\"a\":1}");
        assert_eq!(binding.consumed, 3);
    }

    #[test]
    fn missing_arguments_leave_literal_tokens() {
        let binding = bind_message("Fail %s: %d: %j", &[json!("x")]);
        assert_eq!(binding.message, "Fail x: %d: %j");
        assert_eq!(binding.consumed, 1);
    }

    #[test]
    fn zero_arguments_leave_template_untouched() {
        let binding = bind_message("100%% of %s", &[]);
        assert_eq!(binding.message, "100%% of %s");
        assert_eq!(binding.consumed, 0);
    }

    #[test]
    fn escaped_percent_is_not_a_placeholder() {
        assert_eq!(count_placeholders("100%%s done"), 0);
        assert_eq!(count_placeholders("%s at 100%%"), 1);

        let binding = bind_message("%s at 100%%", &[json!("disk")]);
        assert_eq!(binding.message, "disk at 100%");
    }

    #[test]
    fn unknown_tokens_pass_through() {
        let binding = bind_message("%x %s %", &[json!("a")]);
        assert_eq!(binding.message, "%x a %");
    }

    #[test]
    fn string_placeholder_renders_json_for_non_strings() {
        let binding = bind_message("%s %s %s %s", &[json!(1.5), json!(true), json!(null), json!([1, "a"])]);
        assert_eq!(binding.message, "1.5 true null [1,\"a\"]");
    }

    #[test]
    fn string_placeholder_drops_zero_fraction() {
        let binding = bind_message("%s %s %s %s", &[json!(1.0), json!(-0.0), json!(-3.0), json!(2.25)]);
        assert_eq!(binding.message, "1 0 -3 2.25");

        let binding = bind_message("%j", &[json!(1.0)]);
        assert_eq!(binding.message, "1.0");
    }

    #[test]
    fn integer_placeholder_coerces() {
        let cases = [
            (json!(42), "42"),
            (json!(-7.9), "-7"),
            (json!(0.4), "0"),
            (json!(-0.4), "0"),
            (json!(true), "1"),
            (json!(false), "0"),
            (json!(null), "0"),
            (json!(" 12 "), "12"),
            (json!(""), "0"),
            (json!("abc"), "NaN"),
            (json!({ "a": 1 }), "NaN"),
            (json!(u64::MAX), "18446744073709551615"),
        ];

        for (value, expected) in cases {
            let binding = bind_message("%d", std::slice::from_ref(&value));
            assert_eq!(binding.message, expected, "rendering {value}");
        }
    }

    #[test]
    fn json_placeholder_quotes_strings() {
        let binding = bind_message("%j", &[json!("x")]);
        assert_eq!(binding.message, "\"x\"");
    }

    #[test]
    fn multibyte_text_around_tokens() {
        let binding = bind_message("ошибка %s ✓", &[json!("диск")]);
        assert_eq!(binding.message, "ошибка диск ✓");
    }

    #[test]
    fn trailing_percent_is_safe() {
        assert_eq!(count_placeholders("%"), 0);
        assert_eq!(count_placeholders("%s%"), 1);
    }
}
