//! A TOML v1.0.0 decoder producing either a generic value tree or a
//! caller-defined typed destination, alongside [`MetaData`] describing the
//! document (key order, declared types, and deferred subtrees).
//!
//! # Quick start
//!
//! Use [`parse`] to get a generic tree as a [`Root`]:
//! ```
//! # fn main() -> Result<(), toml_bind::Error> {
//! let root = toml_bind::parse("key = 'value'")?;
//! assert_eq!(root.get("key").and_then(|v| v.as_str()), Some("value"));
//! # Ok(())
//! # }
//! ```
//!
//! Typed decoding goes through the [`Deserialize`] trait. Implementations
//! receive the generic tree and extract fields through a [`TableHelper`],
//! which matches keys case-insensitively (an exact match always wins):
//!
//! ```
//! use toml_bind::{Context, Deserialize, Error, TableHelper, Value};
//!
//! #[derive(Debug)]
//! struct Service {
//!     name: String,
//!     port: u16,
//!     tags: Vec<String>,
//! }
//!
//! impl Deserialize for Service {
//!     fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
//!         let mut th = TableHelper::new(cx, value)?;
//!         let name = th.required("name")?;
//!         let port = th.required("port")?;
//!         let tags = th.optional("tags")?.unwrap_or_default();
//!         th.expect_empty()?;
//!         Ok(Service { name, port, tags })
//!     }
//! }
//!
//! let decoded = toml_bind::decode::<Service>(
//!     "Name = \"proxy\"\nport = 8080\ntags = [\"edge\", \"tls\"]",
//! )?;
//! assert_eq!(decoded.value.name, "proxy");
//! assert_eq!(decoded.value.port, 8080);
//! assert!(decoded.meta.is_defined(&["tags"]));
//! # Ok::<(), toml_bind::Error>(())
//! ```
//!
//! [`decode_into`] binds into an existing destination instead, with the
//! in-place semantics the container impls define: sequences are replaced,
//! maps are merged. On error the destination may be partially modified and
//! should be discarded.
//!
//! Binding can be deferred with [`Primitive`]: the subtree is captured
//! undecoded, reported by [`MetaData::undecoded`], and decoded later with
//! [`MetaData::primitive_decode`].

#![warn(missing_docs)]

mod array;
pub mod de;
mod error;
mod lexer;
mod meta;
mod parser;
mod reader;
mod span;
mod table;
mod time;
mod value;

pub use array::Array;
pub use de::{Context, Deserialize, Primitive, TableHelper};
pub use error::{BindError, BindErrorKind, Error, ParseError, ParseErrorKind};
pub use meta::{KeyPath, MetaData, TomlType};
pub use span::{Span, Spanned};
pub use table::Table;
pub use time::{Date, Datetime, LocalDatetime, Offset, Time};
pub use value::{Key, Value, ValueKind};

use error::{ParseError as PError, ParseErrorKind as PKind};

/// A parsed document: the generic value tree plus its [`MetaData`].
pub struct Root {
    value: Value,
    meta: MetaData,
}

impl Root {
    /// The root table as a [`Value`].
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Mutable access to the root table.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// The document metadata.
    pub fn meta(&self) -> &MetaData {
        &self.meta
    }

    /// Mutable access to the metadata (needed for
    /// [`MetaData::primitive_decode`]).
    pub fn meta_mut(&mut self) -> &mut MetaData {
        &mut self.meta
    }

    /// Splits into the tree and the metadata.
    pub fn into_parts(self) -> (Value, MetaData) {
        (self.value, self.meta)
    }

    /// Looks up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.as_table().and_then(|t| t.get(key))
    }

    /// Creates a [`TableHelper`] over the root table for direct typed
    /// field extraction.
    ///
    /// The helper takes the root table out of this `Root`; once it is
    /// dropped the tree is empty, so extract everything you need through
    /// the one helper and finish it with
    /// [`expect_empty`](TableHelper::expect_empty) (or drop it to ignore
    /// leftovers).
    pub fn helper(&mut self) -> TableHelper<'_> {
        let span = self.value.span();
        let table = match self.value.kind_mut() {
            ValueKind::Table(t) => std::mem::take(t),
            _ => Table::new(),
        };
        TableHelper::from_parts(de::Context::new(&mut self.meta), table, span)
    }

    /// Binds the whole document to `T`.
    pub fn deserialize<T: Deserialize>(mut self) -> Result<Decoded<T>, Error> {
        let mut cx = de::Context::new(&mut self.meta);
        let value = T::deserialize(&mut cx, &mut self.value)?;
        Ok(Decoded {
            value,
            meta: self.meta,
        })
    }
}

impl std::fmt::Debug for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

/// A successfully decoded destination plus the document's [`MetaData`].
#[derive(Debug)]
pub struct Decoded<T> {
    /// The decoded destination.
    pub value: T,
    /// Metadata collected while parsing.
    pub meta: MetaData,
}

/// Parses a TOML document into a generic tree.
pub fn parse(input: &str) -> Result<Root, Error> {
    let (value, meta) = parser::parse_document(input)?;
    Ok(Root { value, meta })
}

/// Parses and binds a TOML document to `T`.
pub fn decode<T: Deserialize>(input: &str) -> Result<Decoded<T>, Error> {
    parse(input)?.deserialize()
}

/// Parses a TOML document and binds it into an existing destination.
///
/// Container semantics differ from [`decode`]: sequences in `dest` are
/// fully replaced while maps are merged (TOML keys overwrite, others are
/// preserved). On error `dest` may be partially modified; discard it.
pub fn decode_into<T: Deserialize>(input: &str, dest: &mut T) -> Result<MetaData, Error> {
    let (mut value, mut meta) = parser::parse_document(input)?;
    let mut cx = de::Context::new(&mut meta);
    T::deserialize_in_place(&mut cx, &mut value, dest)?;
    Ok(meta)
}

/// [`decode`] for raw bytes: validates UTF-8 (and rejects NUL bytes and
/// UTF-16 byte-order marks) before parsing.
pub fn decode_slice<T: Deserialize>(input: &[u8]) -> Result<Decoded<T>, Error> {
    decode(str_from_slice(input)?)
}

/// [`decode_into`] for raw bytes.
pub fn decode_slice_into<T: Deserialize>(input: &[u8], dest: &mut T) -> Result<MetaData, Error> {
    decode_into(str_from_slice(input)?, dest)
}

fn str_from_slice(input: &[u8]) -> Result<&str, Error> {
    reader::preflight(input)?;
    std::str::from_utf8(input).map_err(|e| {
        let at = e.valid_up_to();
        let line = 1 + input[..at].iter().filter(|&&b| b == b'\n').count();
        Error::from(PError::new(
            PKind::InvalidUtf8,
            Span::new(at as u32, (at as u32).saturating_add(1)),
            line,
        ))
    })
}
