//! The source reader: input pre-flight checks and the byte cursor the lexer
//! drives.
//!
//! TOML documents are UTF-8 only. A leading UTF-8 BOM is stripped; a UTF-16
//! BOM or any NUL byte is rejected up front with a message pointing the user
//! at the encoding, since the rest of the pipeline would otherwise produce a
//! baffling character-level error.

#[cfg(test)]
#[path = "./reader_tests.rs"]
mod tests;

use crate::error::{ParseError, ParseErrorKind};
use crate::span::Span;

/// Result of the pre-flight scan: the byte offset parsing should start at
/// (past a UTF-8 BOM, if any).
pub(crate) fn preflight(bytes: &[u8]) -> Result<usize, ParseError> {
    if bytes.starts_with(b"\xfe\xff") || bytes.starts_with(b"\xff\xfe") {
        return Err(ParseError::new(
            ParseErrorKind::Utf16Bom,
            Span::new(0, 2),
            1,
        ));
    }
    if let Some(at) = bytes.iter().position(|&b| b == 0) {
        let line = 1 + bytes[..at].iter().filter(|&&b| b == b'\n').count();
        return Err(ParseError::new(
            ParseErrorKind::NulByte,
            Span::new(at as u32, at as u32 + 1),
            line,
        ));
    }
    if bytes.starts_with(b"\xef\xbb\xbf") {
        Ok(3)
    } else {
        Ok(0)
    }
}

/// A byte cursor over validated UTF-8 input with on-demand line/column
/// resolution.
pub(crate) struct Reader<'s> {
    input: &'s str,
    pos: usize,
}

impl<'s> Reader<'s> {
    pub(crate) fn new(input: &'s str) -> Result<Self, ParseError> {
        let pos = preflight(input.as_bytes())?;
        Ok(Reader { input, pos })
    }

    #[inline]
    pub(crate) fn bytes(&self) -> &'s [u8] {
        self.input.as_bytes()
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Remaining input from the cursor.
    #[inline]
    pub(crate) fn rest(&self) -> &'s [u8] {
        &self.input.as_bytes()[self.pos..]
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    #[inline]
    pub(crate) fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.pos + offset).copied()
    }

    #[inline]
    pub(crate) fn bump(&mut self) {
        self.pos += 1;
    }

    #[inline]
    pub(crate) fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    #[inline]
    pub(crate) fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes a LF or CRLF line terminator.
    pub(crate) fn eat_newline(&mut self) -> bool {
        match self.peek() {
            Some(b'\n') => {
                self.pos += 1;
                true
            }
            Some(b'\r') if self.peek_at(1) == Some(b'\n') => {
                self.pos += 2;
                true
            }
            _ => false,
        }
    }

    /// Consumes spaces and tabs.
    pub(crate) fn eat_whitespace(&mut self) {
        while let Some(b' ' | b'\t') = self.peek() {
            self.pos += 1;
        }
    }

    /// A slice of the input. Callers pass offsets previously observed from
    /// the cursor, which always sit on character boundaries.
    #[inline]
    pub(crate) fn slice(&self, start: usize, end: usize) -> &'s str {
        &self.input[start..end]
    }

    /// The next character at `offset`, for error messages.
    pub(crate) fn char_at(&self, offset: usize) -> char {
        self.input[offset..]
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// 1-based line number of a byte offset. `\r\n` counts as one
    /// terminator since only the `\n` is counted.
    pub(crate) fn line_at(&self, offset: usize) -> usize {
        let end = offset.min(self.input.len());
        1 + self.bytes()[..end].iter().filter(|&&b| b == b'\n').count()
    }

    /// 1-based (line, column) of a byte offset; columns count characters.
    pub(crate) fn position(&self, offset: usize) -> (usize, usize) {
        let end = offset.min(self.input.len());
        let line_start = self.bytes()[..end]
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let column = 1 + self.input[line_start..end].chars().count();
        (self.line_at(offset), column)
    }

    /// Builds a positioned error anchored at `span`.
    pub(crate) fn error(&self, kind: ParseErrorKind, span: Span) -> ParseError {
        ParseError::new(kind, span, self.line_at(span.start as usize))
    }

    pub(crate) fn error_at(&self, kind: ParseErrorKind, start: usize, end: usize) -> ParseError {
        self.error(kind, Span::new(start as u32, end as u32))
    }
}
