//! Schema-free type inference and explicit coercion of raw tokens.
//!
//! Inference tries, in order: integer, float, boolean, date-time, list,
//! tuple, mapping, and finally keeps the token as a string. The order goes
//! from narrowest to broadest; every integer token is also a float token.

use std::fmt::Write;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::literal::parse_literal;
use crate::value::{Kind, Value};

/// Date-time layout recognized when no other format is configured.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static INTEGER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("valid regex"));

static FLOAT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+(\.[0-9]+)?$").expect("valid regex"));

const BOOLEAN_LITERALS: [&str; 4] = ["true", "True", "false", "False"];

pub fn is_integer(token: &str) -> bool {
    INTEGER_PATTERN.is_match(token)
}

/// Digits with an optional fractional part. Plain integers match too.
pub fn is_float(token: &str) -> bool {
    FLOAT_PATTERN.is_match(token)
}

/// Exact match against `true`, `True`, `false`, `False`.
pub fn is_boolean(token: &str) -> bool {
    BOOLEAN_LITERALS.contains(&token)
}

/// Date-time check against [`DEFAULT_DATETIME_FORMAT`].
pub fn is_datetime(token: &str) -> bool {
    Inference::default().is_datetime(token)
}

pub fn is_list(token: &str) -> bool {
    matches!(parse_literal(token), Ok(Value::List(_)))
}

pub fn is_tuple(token: &str) -> bool {
    matches!(parse_literal(token), Ok(Value::Tuple(_)))
}

pub fn is_mapping(token: &str) -> bool {
    matches!(parse_literal(token), Ok(Value::Map(_)))
}

/// Infer a typed value using the default date-time format.
///
/// Returns `None` for an empty token.
pub fn infer(token: &str) -> Option<Value> {
    Inference::default().infer(token)
}

/// Convert a token to an explicitly requested kind.
///
/// Returns `None` when the token does not have the shape of `kind`.
pub fn coerce(token: &str, kind: Kind) -> Option<Value> {
    let value = match kind {
        Kind::String => Some(Value::String(token.to_owned())),
        Kind::Bool => coerce_bool(token),
        Kind::Float => coerce_float(token),
        Kind::Integer => coerce_integer(token),
        Kind::List => parse_literal(token).ok().filter(|v| matches!(v, Value::List(_))),
        Kind::Tuple => parse_literal(token).ok().filter(|v| matches!(v, Value::Tuple(_))),
        Kind::Map => parse_literal(token).ok().filter(|v| matches!(v, Value::Map(_))),
    };
    if value.is_none() {
        debug!(token, kind = %kind, "token does not convert to requested kind");
    }
    value
}

/// Like [`coerce`], with the kind given by name (`"int"`, `"array"`, ...).
///
/// An unrecognized name yields `None`.
pub fn coerce_named(token: &str, kind: &str) -> Option<Value> {
    match kind.parse::<Kind>() {
        Ok(kind) => coerce(token, kind),
        Err(err) => {
            debug!(%err, "ignoring coercion to unknown kind");
            None
        }
    }
}

/// Case-insensitive, unlike [`is_boolean`].
fn coerce_bool(token: &str) -> Option<Value> {
    if token.eq_ignore_ascii_case("true") {
        Some(Value::Bool(true))
    } else if token.eq_ignore_ascii_case("false") {
        Some(Value::Bool(false))
    } else {
        None
    }
}

fn coerce_float(token: &str) -> Option<Value> {
    if !is_float(token) {
        return None;
    }
    token.parse::<f64>().ok().map(Value::Float)
}

fn coerce_integer(token: &str) -> Option<Value> {
    if !is_integer(token) {
        return None;
    }
    token.parse::<i64>().ok().map(Value::Integer)
}

/// Inference settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inference {
    datetime_format: String,
}

impl Default for Inference {
    fn default() -> Self {
        Self {
            datetime_format: DEFAULT_DATETIME_FORMAT.to_owned(),
        }
    }
}

impl Inference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different chrono format string for date-time detection.
    pub fn datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = format.into();
        self
    }

    pub fn format(&self) -> &str {
        &self.datetime_format
    }

    /// Strict date-time check: the token must parse and format back to itself.
    pub fn is_datetime(&self, token: &str) -> bool {
        self.parse_datetime(token).is_some()
    }

    fn parse_datetime(&self, token: &str) -> Option<NaiveDateTime> {
        let format = self.datetime_format.as_str();
        // Date-only formats read as midnight.
        let parsed = match NaiveDateTime::parse_from_str(token, format) {
            Ok(parsed) => parsed,
            Err(_) => NaiveDate::parse_from_str(token, format)
                .ok()?
                .and_hms_opt(0, 0, 0)?,
        };
        // Some formats parse but cannot render a naive value (`%z`).
        let mut rendered = String::with_capacity(token.len());
        write!(rendered, "{}", parsed.format(format)).ok()?;
        (rendered == token).then_some(parsed)
    }

    /// Render a date-time with the configured format, as it was written.
    pub fn render_datetime(&self, value: &NaiveDateTime) -> Option<String> {
        let mut rendered = String::new();
        write!(rendered, "{}", value.format(&self.datetime_format)).ok()?;
        Some(rendered)
    }

    pub fn infer(&self, token: &str) -> Option<Value> {
        if token.is_empty() {
            return None;
        }

        if is_integer(token) {
            // Out-of-range integers stay strings rather than turning into floats.
            return Some(
                token
                    .parse::<i64>()
                    .map(Value::Integer)
                    .unwrap_or_else(|_| Value::String(token.to_owned())),
            );
        }
        if is_float(token)
            && let Ok(value) = token.parse::<f64>()
        {
            return Some(Value::Float(value));
        }
        if is_boolean(token) {
            return Some(Value::Bool(token.eq_ignore_ascii_case("true")));
        }
        if let Some(value) = self.parse_datetime(token) {
            return Some(Value::DateTime(value));
        }
        if let Ok(value @ (Value::List(_) | Value::Tuple(_) | Value::Map(_))) =
            parse_literal(token)
        {
            return Some(value);
        }

        Some(Value::String(token.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_whole_tokens() {
        assert!(is_integer("-42"));
        assert!(is_integer("+7"));
        assert!(!is_integer("4.2"));
        assert!(!is_integer("42 "));
        assert!(is_float("4.2"));
        assert!(is_float("42"));
        assert!(!is_float("4."));
        assert!(!is_float(".5"));
        assert!(!is_float("1e5"));
        assert!(is_boolean("True"));
        assert!(!is_boolean("TRUE"));
        assert!(is_list("[1, 2]"));
        assert!(!is_list("(1, 2)"));
        assert!(is_tuple("(1, 2)"));
        assert!(is_mapping(r#"{"a": 1}"#));
        assert!(!is_mapping("{1, 2}"));
    }

    #[test]
    fn integers_win_over_floats() {
        assert_eq!(infer("5"), Some(Value::Integer(5)));
        assert_eq!(infer("-0"), Some(Value::Integer(0)));
        assert_eq!(infer("5.0"), Some(Value::Float(5.0)));
    }

    #[test]
    fn integer_overflow_stays_string() {
        assert_eq!(
            infer("99999999999999999999"),
            Some(Value::from("99999999999999999999"))
        );
    }

    #[test]
    fn booleans_are_literal_set_only() {
        assert_eq!(infer("true"), Some(Value::Bool(true)));
        assert_eq!(infer("True"), Some(Value::Bool(true)));
        assert_eq!(infer("False"), Some(Value::Bool(false)));
        assert_eq!(infer("TRUE"), Some(Value::from("TRUE")));
    }

    #[test]
    fn datetime_requires_exact_layout() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(7, 5, 0))
            .expect("valid date");
        assert_eq!(infer("2024-03-09 07:05:00"), Some(Value::DateTime(expected)));
        assert_eq!(infer("2024-3-9 07:05:00"), Some(Value::from("2024-3-9 07:05:00")));
        assert_eq!(infer("2024-03-09"), Some(Value::from("2024-03-09")));
        assert_eq!(infer("2024-02-30 00:00:00"), Some(Value::from("2024-02-30 00:00:00")));
    }

    #[test]
    fn custom_datetime_format() {
        let inference = Inference::new().datetime_format("%d/%m/%Y %H:%M");
        assert!(inference.is_datetime("09/03/2024 07:05"));
        assert!(!inference.is_datetime("2024-03-09 07:05:00"));
        assert!(is_datetime("2024-03-09 07:05:00"));
    }

    #[test]
    fn date_only_format_reads_as_midnight() {
        let inference = Inference::new().datetime_format("%Y/%m/%d");
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid date");
        assert_eq!(inference.infer("2024/03/09"), Some(Value::DateTime(expected)));
        assert_eq!(inference.infer("2024/3/9"), Some(Value::from("2024/3/9")));
    }

    #[test]
    fn offset_format_is_not_a_datetime() {
        let inference = Inference::new().datetime_format("%Y-%m-%d %z");
        assert!(!inference.is_datetime("2024-01-01 +0000"));
        assert_eq!(
            inference.infer("2024-01-01 +0000"),
            Some(Value::from("2024-01-01 +0000"))
        );
    }

    #[test]
    fn render_uses_configured_format() {
        let inference = Inference::new().datetime_format("%d/%m/%Y");
        let day = NaiveDate::from_ymd_opt(2024, 1, 31)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid date");
        assert_eq!(inference.render_datetime(&day).as_deref(), Some("31/01/2024"));
    }

    #[test]
    fn containers_in_priority_order() {
        assert_eq!(
            infer("[1, 'two']"),
            Some(Value::List(vec![Value::Integer(1), Value::from("two")]))
        );
        assert_eq!(
            infer("(1, 2)"),
            Some(Value::Tuple(vec![Value::Integer(1), Value::Integer(2)]))
        );
        assert_eq!(
            infer("{'key': 'value'}"),
            Some(Value::Map(vec![(Value::from("key"), Value::from("value"))]))
        );
    }

    #[test]
    fn scalar_literals_fall_back_to_string() {
        assert_eq!(infer("'quoted'"), Some(Value::from("'quoted'")));
        assert_eq!(infer("None"), Some(Value::from("None")));
        assert_eq!(infer("1e5"), Some(Value::from("1e5")));
    }

    #[test]
    fn malformed_literals_fall_back_to_string() {
        assert_eq!(infer("[1, 2,"), Some(Value::from("[1, 2,")));
        assert_eq!(
            infer("__import__('os').system('id')"),
            Some(Value::from("__import__('os').system('id')"))
        );
    }

    #[test]
    fn empty_token_is_absent() {
        assert_eq!(infer(""), None);
    }

    #[test]
    fn explicit_bool_is_case_insensitive() {
        assert_eq!(coerce("TRUE", Kind::Bool), Some(Value::Bool(true)));
        assert_eq!(coerce("false", Kind::Bool), Some(Value::Bool(false)));
        assert_eq!(coerce("yes", Kind::Bool), None);
    }

    #[test]
    fn explicit_numbers() {
        assert_eq!(coerce("5", Kind::Float), Some(Value::Float(5.0)));
        assert_eq!(coerce("5.5", Kind::Integer), None);
        assert_eq!(coerce("-12", Kind::Integer), Some(Value::Integer(-12)));
        assert_eq!(coerce("99999999999999999999", Kind::Integer), None);
    }

    #[test]
    fn explicit_string_is_verbatim() {
        assert_eq!(coerce("[1, 2]", Kind::String), Some(Value::from("[1, 2]")));
    }

    #[test]
    fn explicit_containers_do_not_cross_kinds() {
        assert_eq!(coerce("(1, 2)", Kind::List), None);
        assert_eq!(
            coerce("(1, 2)", Kind::Tuple),
            Some(Value::Tuple(vec![Value::Integer(1), Value::Integer(2)]))
        );
        assert_eq!(coerce("[1]", Kind::Map), None);
    }

    #[test]
    fn named_coercion() {
        assert_eq!(coerce_named("1", "integer"), Some(Value::Integer(1)));
        assert_eq!(coerce_named("True", "boolean"), Some(Value::Bool(true)));
        assert_eq!(coerce_named("[1]", "array"), Some(Value::List(vec![Value::Integer(1)])));
        assert_eq!(coerce_named("1", "number"), None);
    }
}
