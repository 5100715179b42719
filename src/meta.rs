//! Document metadata collected during parsing: the ordered key list, the
//! declared TOML type of every key, and the set of deferred
//! [`Primitive`](crate::de::Primitive) subtrees not yet decoded.

#[cfg(test)]
#[path = "./meta_tests.rs"]
mod tests;

use crate::de::{Context, Deserialize, Primitive};
use crate::value::ValueKind;
use crate::Error;
use indexmap::{Equivalent, IndexMap, IndexSet};
use std::fmt;

/// A fully-qualified key: the sequence of decoded segments from the document
/// root down to a value.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    pub(crate) fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// The path's segments, root first.
    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub(crate) fn push(&mut self, segment: &str) {
        self.segments.push(segment.to_owned());
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }

    fn starts_with(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.segments.len()
            && prefix
                .iter()
                .zip(&self.segments)
                .all(|(p, s)| *p == s.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for KeyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn is_bare_segment(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

impl fmt::Display for KeyPath {
    /// Dotted form; segments that are not bare keys are double-quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if is_bare_segment(seg) {
                f.write_str(seg)?;
            } else {
                write!(f, "\"{}\"", seg.replace('\\', "\\\\").replace('"', "\\\""))?;
            }
        }
        Ok(())
    }
}

/// Lets `&[&str]` query the path-keyed maps without allocating.
impl<'a> Equivalent<KeyPath> for [&'a str] {
    fn equivalent(&self, key: &KeyPath) -> bool {
        self.len() == key.segments.len()
            && self
                .iter()
                .zip(&key.segments)
                .all(|(a, b)| *a == b.as_str())
    }
}

/// The TOML type declared for a key, as recorded in [`MetaData`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TomlType {
    /// Any of the four string forms.
    String,
    /// An integer.
    Integer,
    /// A float.
    Float,
    /// A boolean.
    Bool,
    /// Any of the four temporal forms.
    Datetime,
    /// An array value.
    Array,
    /// A table (header, dotted, or inline).
    Hash,
    /// An array of tables.
    ArrayHash,
}

impl TomlType {
    pub(crate) fn of_value(kind: &ValueKind) -> Self {
        match kind {
            ValueKind::String(..) => Self::String,
            ValueKind::Integer(..) => Self::Integer,
            ValueKind::Float(..) => Self::Float,
            ValueKind::Boolean(..) => Self::Bool,
            ValueKind::Datetime(..)
            | ValueKind::LocalDatetime(..)
            | ValueKind::LocalDate(..)
            | ValueKind::LocalTime(..) => Self::Datetime,
            ValueKind::Array(..) => Self::Array,
            ValueKind::Table(..) => Self::Hash,
        }
    }

    /// The canonical type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Bool => "Bool",
            Self::Datetime => "Datetime",
            Self::Array => "Array",
            Self::Hash => "Hash",
            Self::ArrayHash => "ArrayHash",
        }
    }
}

impl fmt::Display for TomlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata about a decoded document, returned alongside the decoded value.
///
/// Keys appear in document order, each exactly once (array-of-tables
/// entries are addressed by their shared path, without an index).
#[derive(Default, Debug)]
pub struct MetaData {
    keys: IndexMap<KeyPath, TomlType>,
    undecoded: IndexSet<KeyPath>,
}

impl MetaData {
    /// All keys the document defined, in document order.
    pub fn keys(&self) -> impl Iterator<Item = &KeyPath> {
        self.keys.keys()
    }

    /// The declared TOML type of a key, or `None` if the key was never
    /// defined.
    pub fn type_of(&self, path: &[&str]) -> Option<TomlType> {
        self.keys.get(path).copied()
    }

    /// Returns `true` if the key was defined, directly or as an ancestor
    /// table of a defined key.
    pub fn is_defined(&self, path: &[&str]) -> bool {
        if path.is_empty() {
            return false;
        }
        self.keys.contains_key(path) || self.keys.keys().any(|k| k.starts_with(path))
    }

    /// Key paths captured as [`Primitive`]s and not yet decoded, in
    /// document order.
    pub fn undecoded(&self) -> impl Iterator<Item = &KeyPath> {
        self.undecoded.iter()
    }

    /// Decodes a deferred subtree, removing its path from the undecoded
    /// set.
    pub fn primitive_decode<T: Deserialize>(&mut self, prim: Primitive) -> Result<T, Error> {
        let (path, mut value) = prim.into_parts();
        self.undecoded.shift_remove(&path);
        let mut cx = Context::resuming(self, path);
        T::deserialize(&mut cx, &mut value)
    }

    /// In-place variant of [`primitive_decode`](Self::primitive_decode):
    /// sequences in `place` are replaced, maps are merged.
    pub fn primitive_decode_into<T: Deserialize>(
        &mut self,
        prim: Primitive,
        place: &mut T,
    ) -> Result<(), Error> {
        let (path, mut value) = prim.into_parts();
        self.undecoded.shift_remove(&path);
        let mut cx = Context::resuming(self, path);
        T::deserialize_in_place(&mut cx, &mut value, place)
    }

    /// Records a key and its declared type. The first record for a path
    /// wins; later records (new array-of-tables entries, keys repeated
    /// inside them) neither duplicate the key nor change its type.
    pub(crate) fn record(&mut self, path: KeyPath, ty: TomlType) {
        self.keys.entry(path).or_insert(ty);
    }

    pub(crate) fn mark_undecoded(&mut self, path: KeyPath) {
        self.undecoded.insert(path);
    }
}
