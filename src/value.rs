use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::UnknownKind;
use crate::infer::DEFAULT_DATETIME_FORMAT;

/// A raw token after inference or explicit coercion.
///
/// `Null` only ever appears inside a container; top-level lookups report
/// absence with `Option::None` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Key/value pairs in literal order.
    Map(Vec<(Value, Value)>),
    Null,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Self::DateTime(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Look up a string key in a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(candidate, _)| candidate.as_str() == Some(key))
            .map(|(_, value)| value)
    }

    /// Whether this value may be used as a mapping key.
    pub(crate) fn is_hashable(&self) -> bool {
        match self {
            Self::List(_) | Self::Map(_) => false,
            Self::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    fn fmt_nested(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => write!(f, "{value:?}"),
            other => other.fmt(f),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => f.write_str(value),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
            Self::DateTime(value) => write!(f, "{}", value.format(DEFAULT_DATETIME_FORMAT)),
            Self::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Self::Map(pairs) => {
                f.write_str("{")?;
                for (idx, (key, value)) in pairs.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    key.fmt_nested(f)?;
                    f.write_str(": ")?;
                    value.fmt_nested(f)?;
                }
                f.write_str("}")
            }
            Self::Null => f.write_str("null"),
        }
    }
}

fn write_items(f: &mut Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        item.fmt_nested(f)?;
    }
    Ok(())
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(value) => serializer.serialize_str(value),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Float(value) => serializer.serialize_f64(*value),
            Self::DateTime(value) => serializer.collect_str(&value.format(DEFAULT_DATETIME_FORMAT)),
            Self::List(items) | Self::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(pairs) => {
                // JSON-like formats only accept string keys.
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (key, value) in pairs {
                    map.serialize_entry(&key.to_string(), value)?;
                }
                map.end()
            }
            Self::Null => serializer.serialize_unit(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Target kind for explicit coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Bool,
    Float,
    Integer,
    List,
    Tuple,
    Map,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Integer => "int",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Map => "map",
        }
    }
}

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "str" | "string" => Ok(Self::String),
            "bool" | "boolean" => Ok(Self::Bool),
            "float" => Ok(Self::Float),
            "int" | "integer" => Ok(Self::Integer),
            "list" | "array" | "sequence" => Ok(Self::List),
            "tuple" => Ok(Self::Tuple),
            "dict" | "map" | "mapping" => Ok(Self::Map),
            other => Err(UnknownKind(other.to_owned())),
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_accept_synonyms() {
        for (name, kind) in [
            ("str", Kind::String),
            ("string", Kind::String),
            ("bool", Kind::Bool),
            ("boolean", Kind::Bool),
            ("float", Kind::Float),
            ("int", Kind::Integer),
            ("integer", Kind::Integer),
            ("list", Kind::List),
            ("array", Kind::List),
            ("sequence", Kind::List),
            ("tuple", Kind::Tuple),
            ("dict", Kind::Map),
            ("map", Kind::Map),
            ("mapping", Kind::Map),
        ] {
            assert_eq!(name.parse::<Kind>(), Ok(kind), "{name}");
        }
    }

    #[test]
    fn kind_names_are_case_sensitive() {
        let err = "Int".parse::<Kind>().expect_err("expected unknown kind");
        assert_eq!(err, UnknownKind("Int".to_owned()));
    }

    #[test]
    fn display_quotes_nested_strings_only() {
        let value = Value::Map(vec![(
            Value::from("hosts"),
            Value::Tuple(vec![Value::from("a"), Value::Integer(1), Value::Float(2.0)]),
        )]);
        assert_eq!(value.to_string(), r#"{"hosts": ("a", 1, 2.0)}"#);
        assert_eq!(Value::from("plain").to_string(), "plain");
        assert_eq!(Value::Tuple(vec![Value::Null]).to_string(), "(null,)");
    }

    #[test]
    fn serializes_to_json() {
        let value = Value::Map(vec![
            (Value::Integer(1), Value::List(vec![Value::Bool(true), Value::Null])),
            (Value::from("name"), Value::from("app")),
        ]);
        let json = serde_json::to_string(&value).expect("serialize should succeed");
        assert_eq!(json, r#"{"1":[true,null],"name":"app"}"#);
    }

    #[test]
    fn map_lookup_by_string_key() {
        let value = Value::Map(vec![(Value::from("port"), Value::Integer(80))]);
        assert_eq!(value.get("port"), Some(&Value::Integer(80)));
        assert_eq!(value.get("missing"), None);
        assert_eq!(Value::Integer(1).get("port"), None);
    }
}
