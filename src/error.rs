//! Error types for parsing and binding.
//!
//! Two families, both fatal to the decode call that raised them:
//! [`ParseError`] from the reader/lexer/parser (positioned, with the last
//! key being parsed as context) and [`BindError`] from the binder (carrying
//! the TOML key path and the destination mismatch).

#[cfg(test)]
#[path = "./error_tests.rs"]
mod tests;

use crate::span::Span;
use std::borrow::Cow;
use std::fmt;

/// Any error that can occur while decoding TOML.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The document is not valid TOML.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The document is valid TOML but does not fit the destination.
    #[error(transparent)]
    Bind(#[from] BindError),
}

impl Error {
    /// Returns the parse error, if this is one.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Bind(_) => None,
        }
    }

    /// Returns the bind error, if this is one.
    pub fn as_bind(&self) -> Option<&BindError> {
        match self {
            Error::Bind(e) => Some(e),
            Error::Parse(_) => None,
        }
    }
}

/// What went wrong while tokenizing or parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// A NUL byte anywhere in the input.
    #[error("files cannot contain NULL bytes; probably using UTF-16; TOML files must be UTF-8")]
    NulByte,

    /// The input starts with a UTF-16 byte-order mark.
    #[error("file starts with a UTF-16 byte-order mark; TOML files must be UTF-8")]
    Utf16Bom,

    /// Byte input that is not valid UTF-8.
    #[error("invalid UTF-8")]
    InvalidUtf8,

    /// The source ended where more input was required.
    #[error("unexpected EOF; expected {expected}")]
    UnexpectedEof {
        /// Description of what should have come next.
        expected: &'static str,
    },

    /// Some other token appeared where a specific one was required.
    #[error("expected {expected} but found {found} instead")]
    Expected {
        /// Description of what should have come next.
        expected: &'static str,
        /// Description of what was actually there.
        found: Cow<'static, str>,
    },

    /// A raw control character inside a string, comment, or between tokens.
    #[error("control characters are not allowed: {0:?}")]
    ControlChar(char),

    /// An unknown backslash escape in a basic string.
    #[error("invalid escape character in string: {0:?}")]
    InvalidEscape(char),

    /// A `\u`/`\U` escape naming a value outside the Unicode scalar range.
    #[error("invalid escape value: {0:#x}")]
    InvalidEscapeValue(u32),

    /// A non-hex digit inside a `\u`/`\U` escape.
    #[error("invalid hex escape character in string: {0:?}")]
    InvalidHexEscape(char),

    /// A decimal number starting with an unnecessary zero.
    #[error("invalid number: cannot have leading zeroes")]
    LeadingZero,

    /// A sign in front of a hex/octal/binary literal, e.g. `+0x3`.
    #[error("cannot use sign with non-decimal numbers: '{0}'")]
    SignedNonDecimal(String),

    /// An uppercase base prefix, e.g. `0B0`.
    #[error("base prefixes must be lowercase; expected 'x', 'o', or 'b', but got {0:?} instead")]
    UppercaseBasePrefix(char),

    /// A `_` separator not between two digits.
    #[error("underscores in numbers must be surrounded by digits")]
    UnderscorePlacement,

    /// A malformed integer literal.
    #[error("invalid integer: '{0}'")]
    InvalidInteger(String),

    /// An integer literal that does not fit a signed 64-bit value.
    #[error("integer '{0}' is out of range of int64")]
    IntegerTooLarge(String),

    /// A malformed float literal, including broken `inf`/`nan` forms.
    #[error("invalid float: '{0}'")]
    InvalidFloat(String),

    /// A token shaped like a date or time that is not a valid one.
    #[error("invalid datetime: '{0}'")]
    InvalidDatetime(String),

    /// A multiline string used as a key.
    #[error("multiline strings are not allowed for keys")]
    MultilineKey,

    /// A line break inside `{ ... }`.
    #[error("newlines are not allowed within inline tables")]
    NewlineInInlineTable,

    /// A key path assigned more than once.
    #[error("key '{0}' has already been defined")]
    DuplicateKey(String),

    /// A `[header]` repeated for an already-explicit table.
    #[error("table '{0}' has already been defined")]
    DuplicateTable(String),

    /// `[[header]]` naming an existing plain table or static array.
    #[error("cannot redefine table '{0}' as an array of tables")]
    RedefineAsArray(String),

    /// A later statement adding keys under a closed inline table.
    #[error("inline tables cannot be extended: '{0}'")]
    ExtendInlineTable(String),

    /// A dotted key traversing a value that is not a table.
    #[error("dotted key '{0}' attempted to extend a non-table value")]
    DottedKeyInvalidType(String),

    /// Nesting of arrays/inline tables beyond the supported depth.
    #[error("recursion limit exceeded while parsing nested values")]
    RecursionLimit,
}

/// A positioned error from the source reader, lexer, or parser.
///
/// Carries the 1-based line of the offending input, the most recent key
/// being parsed (dotted form, empty if none), and the byte [`Span`] of the
/// offending text.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// 1-based line number of the error.
    pub line: usize,
    /// The most recent key being parsed, as a dotted string. Empty if the
    /// error occurred before any key.
    pub last_key: String,
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Byte range of the offending input.
    pub span: Span,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, span: Span, line: usize) -> Self {
        Self {
            line,
            last_key: String::new(),
            kind,
            span,
        }
    }

    /// Sets the last-key context unless one is already present.
    pub(crate) fn with_last_key(mut self, key: &str) -> Self {
        if self.last_key.is_empty() && !key.is_empty() {
            self.last_key = key.to_owned();
        }
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toml: line {}: {}", self.line, self.kind)?;
        if !self.last_key.is_empty() {
            write!(f, "; last key parsed '{}'", self.last_key)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// What went wrong while binding a value to a destination.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum BindErrorKind {
    /// The TOML value's type does not match the destination.
    #[error("expected {expected}, found {found}")]
    Wanted {
        /// What the destination accepts.
        expected: &'static str,
        /// The TOML type that was actually there.
        found: &'static str,
    },

    /// An integer value outside the destination type's range.
    #[error("integer {value} is out of range for {target}")]
    IntegerOutOfRange {
        /// The TOML integer.
        value: i64,
        /// The destination type name.
        target: &'static str,
    },

    /// A TOML array bound to a fixed-length destination of another length.
    #[error("expected array of length {expected}, found {found}")]
    ArrayLength {
        /// The destination length.
        expected: usize,
        /// The TOML array length.
        found: usize,
    },

    /// A required field absent from the table.
    #[error("missing field '{0}' in table")]
    MissingField(&'static str),

    /// Keys left over after a destination consumed everything it knows.
    #[error("unexpected keys in table: {0:?}")]
    UnexpectedKeys(Vec<String>),

    /// A failure raised by a hand-written [`Deserialize`](crate::Deserialize) impl.
    #[error("{0}")]
    Custom(Cow<'static, str>),
}

/// An error from binding a parsed document to a destination.
#[derive(Debug, Clone)]
pub struct BindError {
    /// Dotted path of the TOML key being bound. Empty at the document root.
    pub key: String,
    /// What went wrong.
    pub kind: BindErrorKind,
}

impl BindError {
    pub(crate) fn new(kind: BindErrorKind, key: String) -> Self {
        Self { key, kind }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toml: {}", self.kind)?;
        if !self.key.is_empty() {
            write!(f, " for key '{}'", self.key)?;
        }
        Ok(())
    }
}

impl std::error::Error for BindError {}
