//! The [`Value`] tree: a semantically-typed TOML value with its source span.

#[cfg(test)]
#[path = "./value_tests.rs"]
mod tests;

use crate::span::Span;
use crate::time::{Date, Datetime, LocalDatetime, Time};
use std::fmt;

/// A toml array
pub use crate::array::Array;
/// A toml table: flat list of key-value pairs in insertion order
pub use crate::table::Table;

/// A parsed TOML value with source span information.
pub struct Value {
    span: Span,
    kind: ValueKind,
}

/// The payload of a [`Value`]: one case per TOML value type.
///
/// The four temporal cases are distinct types; a local date-time carries no
/// offset and cannot be turned into an instant without one (see
/// [`LocalDatetime::to_unix_nanoseconds`]).
#[derive(Debug)]
pub enum ValueKind {
    /// A string (any of the four quoting forms, already decoded).
    String(String),
    /// A 64-bit signed integer.
    Integer(i64),
    /// A 64-bit IEEE-754 float. NaN and ±infinity are representable.
    Float(f64),
    /// A boolean.
    Boolean(bool),
    /// An offset date-time: an instant with a fixed UTC offset.
    Datetime(Datetime),
    /// A date and time without offset.
    LocalDatetime(LocalDatetime),
    /// A date without time or offset.
    LocalDate(Date),
    /// A time without date or offset.
    LocalTime(Time),
    /// An ordered sequence of values; heterogeneous types allowed.
    Array(Array),
    /// A mapping from string keys to values, in insertion order.
    Table(Table),
}

impl ValueKind {
    /// Gets the type of the value as a string, for error messages.
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::String(..) => "string",
            Self::Integer(..) => "integer",
            Self::Float(..) => "float",
            Self::Boolean(..) => "boolean",
            Self::Datetime(..) | Self::LocalDatetime(..) => "datetime",
            Self::LocalDate(..) => "date",
            Self::LocalTime(..) => "time",
            Self::Array(..) => "array",
            Self::Table(..) => "table",
        }
    }
}

impl Value {
    #[inline]
    pub(crate) fn new(kind: ValueKind, span: Span) -> Self {
        Self { span, kind }
    }

    #[inline]
    pub(crate) fn table(table: Table, span: Span) -> Self {
        Self::new(ValueKind::Table(table), span)
    }

    #[inline]
    pub(crate) fn array(array: Array, span: Span) -> Self {
        Self::new(ValueKind::Array(array), span)
    }

    /// Returns the source span of this value.
    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Gets the type of the value as a string, for error messages.
    #[inline]
    pub fn type_str(&self) -> &'static str {
        self.kind.type_str()
    }

    /// Returns the payload for pattern matching.
    #[inline]
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Returns the payload mutably for pattern matching.
    #[inline]
    pub fn kind_mut(&mut self) -> &mut ValueKind {
        &mut self.kind
    }

    /// Consumes the value and returns the payload.
    ///
    /// The span is lost; call [`Self::span()`] before this if needed.
    #[inline]
    pub fn into_kind(self) -> ValueKind {
        self.kind
    }

    /// Takes this value, leaving `Boolean(false)` behind. The span is
    /// preserved on both sides.
    #[inline]
    pub fn take(&mut self) -> Value {
        let span = self.span;
        std::mem::replace(
            self,
            Value {
                span,
                kind: ValueKind::Boolean(false),
            },
        )
    }
}

impl Value {
    /// Returns a borrowed string if this is a string value.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns an `i64` if this is an integer value.
    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self.kind {
            ValueKind::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Returns an `f64` if this is a float value.
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self.kind {
            ValueKind::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Returns a `bool` if this is a boolean value.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            ValueKind::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the offset date-time if this is one.
    #[inline]
    pub fn as_datetime(&self) -> Option<Datetime> {
        match self.kind {
            ValueKind::Datetime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns the local date-time if this is one.
    #[inline]
    pub fn as_local_datetime(&self) -> Option<LocalDatetime> {
        match self.kind {
            ValueKind::LocalDatetime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Returns the local date if this is one.
    #[inline]
    pub fn as_date(&self) -> Option<Date> {
        match self.kind {
            ValueKind::LocalDate(d) => Some(d),
            _ => None,
        }
    }

    /// Returns the local time if this is one.
    #[inline]
    pub fn as_time(&self) -> Option<Time> {
        match self.kind {
            ValueKind::LocalTime(t) => Some(t),
            _ => None,
        }
    }

    /// Returns a borrowed array if this is an array value.
    #[inline]
    pub fn as_array(&self) -> Option<&Array> {
        match &self.kind {
            ValueKind::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns a borrowed table if this is a table value.
    #[inline]
    pub fn as_table(&self) -> Option<&Table> {
        match &self.kind {
            ValueKind::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Returns a mutable array reference.
    #[inline]
    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match &mut self.kind {
            ValueKind::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns a mutable table reference.
    #[inline]
    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match &mut self.kind {
            ValueKind::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Returns true if the value is a table and has the specified key.
    #[inline]
    pub fn has_key(&self, key: &str) -> bool {
        self.as_table().is_some_and(|t| t.contains_key(key))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::String(s) => s.fmt(f),
            ValueKind::Integer(i) => i.fmt(f),
            ValueKind::Float(v) => v.fmt(f),
            ValueKind::Boolean(b) => b.fmt(f),
            ValueKind::Datetime(dt) => write!(f, "{dt}"),
            ValueKind::LocalDatetime(dt) => write!(f, "{dt}"),
            ValueKind::LocalDate(d) => write!(f, "{d}"),
            ValueKind::LocalTime(t) => write!(f, "{t}"),
            ValueKind::Array(a) => a.fmt(f),
            ValueKind::Table(t) => t.fmt(f),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S>(&self, ser: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match &self.kind {
            ValueKind::String(s) => ser.serialize_str(s),
            ValueKind::Integer(i) => ser.serialize_i64(*i),
            ValueKind::Float(f) => ser.serialize_f64(*f),
            ValueKind::Boolean(b) => ser.serialize_bool(*b),
            ValueKind::Datetime(dt) => ser.collect_str(dt),
            ValueKind::LocalDatetime(dt) => ser.collect_str(dt),
            ValueKind::LocalDate(d) => ser.collect_str(d),
            ValueKind::LocalTime(t) => ser.collect_str(t),
            ValueKind::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = ser.serialize_seq(Some(arr.len()))?;
                for ele in arr {
                    seq.serialize_element(ele)?;
                }
                seq.end()
            }
            ValueKind::Table(tab) => {
                use serde::ser::SerializeMap;
                let mut map = ser.serialize_map(Some(tab.len()))?;
                for (k, v) in tab {
                    map.serialize_entry(&k.name, v)?;
                }
                map.end()
            }
        }
    }
}

/// A toml table key
#[derive(Clone)]
pub struct Key {
    /// The key segment text, after quote decoding.
    pub name: String,
    /// The span for the key in the original document
    pub span: Span,
}

impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq(&other.name)
    }
}

impl Eq for Key {}
