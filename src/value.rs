//! Tagged unions for configuration values whose type is constrained but
//! dynamic.
//!
//! Several node kinds accept values that may be one of a few primitive
//! types: the default node's field defaults, a UDF option value, a group-by
//! dimension that is either a tag name or the star marker, and the join
//! node's fill option which is either a sentinel word or a number. Each of
//! these is modelled as an explicit enum with its own serde form so the
//! validator can enforce types at build time instead of carrying opaque
//! dynamic values around.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A primitive field value: float, integer, boolean, or string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A string value.
    Str(String),
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

/// A grouping dimension: a named tag or the star marker (group by all).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dimension {
    /// Group by every dimension (`"*"` on the wire).
    Star,
    /// Group by one named tag.
    Tag(String),
}

impl Dimension {
    /// The wire representation of this dimension.
    pub fn as_str(&self) -> &str {
        match self {
            Dimension::Star => "*",
            Dimension::Tag(name) => name,
        }
    }
}

impl From<&str> for Dimension {
    fn from(s: &str) -> Self {
        if s == "*" {
            Dimension::Star
        } else {
            Dimension::Tag(s.to_string())
        }
    }
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Dimension::from(s.as_str()))
    }
}

/// Deserialize an `i64` config field, also accepting the integer-in-string
/// form some historical payloads carry.
pub(crate) fn de_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    struct I64Visitor;

    impl<'de> Visitor<'de> for I64Visitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "an integer, possibly carried as a string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| de::Error::custom("integer overflows"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            v.parse().map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_any(I64Visitor)
}

/// Check a list of grouping dimensions: every name non-empty, and the star
/// marker never mixed with named dimensions.
pub(crate) fn validate_dimensions(dims: &[Dimension]) -> Result<(), String> {
    let mut star = false;
    let mut named = false;
    for dim in dims {
        match dim {
            Dimension::Star => star = true,
            Dimension::Tag(name) => {
                if name.is_empty() {
                    return Err("group by dimension must not be empty".to_string());
                }
                named = true;
            }
        }
    }
    if star && named {
        return Err("cannot group by both star and named dimensions".to_string());
    }
    Ok(())
}

/// How a join or query fills missing values: a sentinel word or a number.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FillKind {
    /// Do not fill (`"none"`).
    NoFill,
    /// Fill with JSON null (`"null"`).
    Null,
    /// Carry the previous value forward (`"previous"`).
    Previous,
    /// Fill with a fixed number.
    Value(f64),
}

impl Serialize for FillKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FillKind::NoFill => serializer.serialize_str("none"),
            FillKind::Null => serializer.serialize_str("null"),
            FillKind::Previous => serializer.serialize_str("previous"),
            FillKind::Value(v) => serializer.serialize_f64(*v),
        }
    }
}

struct FillVisitor;

impl<'de> Visitor<'de> for FillVisitor {
    type Value = FillKind;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"none\", \"null\", \"previous\", or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FillKind, E> {
        match v {
            "none" => Ok(FillKind::NoFill),
            "null" => Ok(FillKind::Null),
            "previous" => Ok(FillKind::Previous),
            other => Err(de::Error::custom(format!("unknown fill option {other:?}"))),
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FillKind, E> {
        Ok(FillKind::Value(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FillKind, E> {
        Ok(FillKind::Value(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FillKind, E> {
        Ok(FillKind::Value(v as f64))
    }
}

impl<'de> Deserialize<'de> for FillKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FillVisitor)
    }
}
