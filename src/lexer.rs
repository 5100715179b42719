//! The tokenizer: a deterministic state machine producing positioned,
//! typed tokens.
//!
//! The lexer owns everything character-shaped: string quoting and escapes,
//! number validity (signs, bases, underscores, leading zeros), datetime
//! recognition, comments, and the newline rules that differ between the top
//! level, bracketed arrays (newlines ignored), and inline tables (newlines
//! forbidden). The parser above it deals purely in tokens.

#[cfg(test)]
#[path = "./lexer_tests.rs"]
mod tests;

use crate::error::{ParseError, ParseErrorKind};
use crate::reader::Reader;
use crate::span::Span;
use crate::time::{self, DatetimeParts};
use std::borrow::Cow;

/// A lexed token: kind plus the byte span it came from. String-like kinds
/// span their decoded content (inside the quotes); all others span the
/// raw text.
#[derive(Debug)]
pub(crate) struct Token<'s> {
    pub(crate) kind: TokenKind<'s>,
    pub(crate) span: Span,
}

#[derive(Debug)]
pub(crate) enum TokenKind<'s> {
    /// An unquoted key segment.
    KeyBare(&'s str),
    /// A quoted key segment, quote-decoded.
    KeyQuoted(Cow<'s, str>),
    Dot,
    Equals,
    /// `[` — a table header opener in key position, an array opener in
    /// value position.
    LBracket,
    /// `[[` at the start of a line.
    LBracketDouble,
    RBracket,
    RBracketDouble,
    LBrace,
    RBrace,
    Comma,
    /// A basic string, escape-decoded.
    String(Cow<'s, str>),
    /// A multiline basic string, escape-decoded, leading newline stripped.
    MultilineString(Cow<'s, str>),
    /// A literal string (no escapes).
    LiteralString(Cow<'s, str>),
    /// A multiline literal string, leading newline stripped.
    MultilineLiteralString(Cow<'s, str>),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Any of the four temporal forms; the parser picks the variant from
    /// which parts are present.
    Datetime(DatetimeParts),
    Newline,
    Eof,
}

impl TokenKind<'_> {
    /// Short description for "expected X but found Y" messages.
    pub(crate) fn describe(&self) -> Cow<'static, str> {
        match self {
            TokenKind::KeyBare(s) => format!("'{s}'").into(),
            TokenKind::KeyQuoted(_)
            | TokenKind::String(_)
            | TokenKind::MultilineString(_)
            | TokenKind::LiteralString(_)
            | TokenKind::MultilineLiteralString(_) => "a string".into(),
            TokenKind::Dot => "'.'".into(),
            TokenKind::Equals => "'='".into(),
            TokenKind::LBracket | TokenKind::LBracketDouble => "'['".into(),
            TokenKind::RBracket => "']'".into(),
            TokenKind::RBracketDouble => "']]'".into(),
            TokenKind::LBrace => "'{'".into(),
            TokenKind::RBrace => "'}'".into(),
            TokenKind::Comma => "a comma".into(),
            TokenKind::Integer(_) => "an integer".into(),
            TokenKind::Float(_) => "a float".into(),
            TokenKind::Bool(_) => "a boolean".into(),
            TokenKind::Datetime(_) => "a datetime".into(),
            TokenKind::Newline => "'\\n'".into(),
            TokenKind::Eof => "end of file".into(),
        }
    }
}

/// Bracketed contexts that change newline handling.
#[derive(Copy, Clone, PartialEq, Debug)]
enum Scope {
    Array,
    InlineTable,
}

pub(crate) struct Lexer<'s> {
    rd: Reader<'s>,
    scopes: Vec<Scope>,
    /// The next token position expects a value (after `=`, inside an
    /// array, after a comma in an array).
    expect_value: bool,
    /// Inside a `[header]` / `[[header]]` line; the flag records whether
    /// the opener was doubled so the closer can be matched.
    header: Option<bool>,
}

#[inline]
fn is_keylike(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

impl<'s> Lexer<'s> {
    pub(crate) fn new(input: &'s str) -> Result<Self, ParseError> {
        Ok(Lexer {
            rd: Reader::new(input)?,
            scopes: Vec::new(),
            expect_value: false,
            header: None,
        })
    }

    #[inline]
    pub(crate) fn reader(&self) -> &Reader<'s> {
        &self.rd
    }

    /// Produces the next token, skipping whitespace and comments.
    pub(crate) fn next(&mut self) -> Result<Token<'s>, ParseError> {
        self.skip_trivia()?;
        let start = self.rd.pos();
        match self.rd.peek() {
            None => Ok(self.token(TokenKind::Eof, start)),
            Some(b'\n' | b'\r') => {
                if self.rd.eat_newline() {
                    self.expect_value = false;
                    Ok(self.token(TokenKind::Newline, start))
                } else {
                    self.rd.bump();
                    Err(self
                        .rd
                        .error_at(ParseErrorKind::ControlChar('\r'), start, start + 1))
                }
            }
            Some(_) if self.expect_value => self.value_token(start),
            Some(b) => self.key_token(b, start),
        }
    }

    fn token(&self, kind: TokenKind<'s>, start: usize) -> Token<'s> {
        Token {
            kind,
            span: Span::new(start as u32, self.rd.pos() as u32),
        }
    }

    /// After a completed value, the next position is another value only
    /// when the innermost scope is an array.
    fn after_value(&mut self) {
        self.expect_value = self.scopes.last() == Some(&Scope::Array);
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.rd.peek() {
                Some(b' ' | b'\t') => self.rd.bump(),
                Some(b'#') => self.eat_comment()?,
                Some(b'\n') | Some(b'\r') => {
                    match self.scopes.last() {
                        Some(Scope::Array) => {
                            let at = self.rd.pos();
                            if !self.rd.eat_newline() {
                                self.rd.bump();
                                return Err(self.rd.error_at(
                                    ParseErrorKind::ControlChar('\r'),
                                    at,
                                    at + 1,
                                ));
                            }
                        }
                        Some(Scope::InlineTable) => {
                            let at = self.rd.pos();
                            return Err(self.rd.error_at(
                                ParseErrorKind::NewlineInInlineTable,
                                at,
                                at + 1,
                            ));
                        }
                        // Top level: the newline is a token.
                        None => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Consumes `#` up to (not including) the line terminator, rejecting
    /// control characters in the comment body.
    fn eat_comment(&mut self) -> Result<(), ParseError> {
        self.rd.bump();
        loop {
            match self.rd.peek() {
                None | Some(b'\n') => return Ok(()),
                Some(b'\r') if self.rd.peek_at(1) == Some(b'\n') => return Ok(()),
                Some(0x09) | Some(0x20..=0x7E) | Some(0x80..) => self.rd.bump(),
                Some(b) => {
                    let at = self.rd.pos();
                    return Err(self.rd.error_at(
                        ParseErrorKind::ControlChar(b as char),
                        at,
                        at + 1,
                    ));
                }
            }
        }
    }

    fn describe_at(&self, offset: usize) -> Cow<'static, str> {
        match self.rd.bytes().get(offset) {
            None => "end of file".into(),
            Some(b'\n') => "'\\n'".into(),
            Some(b'\r') => "'\\r'".into(),
            Some(b'\t') => "'\\t'".into(),
            Some(_) => format!("'{}'", self.rd.char_at(offset)).into(),
        }
    }

    fn read_keylike(&mut self) -> &'s str {
        let start = self.rd.pos();
        while let Some(b) = self.rd.peek() {
            if !is_keylike(b) {
                break;
            }
            self.rd.bump();
        }
        self.rd.slice(start, self.rd.pos())
    }

    // ---- key position ----------------------------------------------------

    fn key_token(&mut self, b: u8, start: usize) -> Result<Token<'s>, ParseError> {
        match b {
            b'=' => {
                self.rd.bump();
                self.expect_value = true;
                Ok(self.token(TokenKind::Equals, start))
            }
            b'.' => {
                self.rd.bump();
                Ok(self.token(TokenKind::Dot, start))
            }
            b',' if self.scopes.last() == Some(&Scope::InlineTable) => {
                self.rd.bump();
                Ok(self.token(TokenKind::Comma, start))
            }
            b'}' if self.scopes.last() == Some(&Scope::InlineTable) => {
                self.rd.bump();
                self.scopes.pop();
                self.after_value();
                Ok(self.token(TokenKind::RBrace, start))
            }
            b'[' if self.scopes.is_empty() && self.header.is_none() => {
                self.rd.bump();
                if self.rd.eat(b'[') {
                    self.header = Some(true);
                    Ok(self.token(TokenKind::LBracketDouble, start))
                } else {
                    self.header = Some(false);
                    Ok(self.token(TokenKind::LBracket, start))
                }
            }
            b']' if self.header.is_some() => {
                self.rd.bump();
                if self.header == Some(true) {
                    if !self.rd.eat(b']') {
                        let at = self.rd.pos();
                        return Err(self.rd.error_at(
                            ParseErrorKind::Expected {
                                expected: "']]'",
                                found: self.describe_at(at),
                            },
                            start,
                            at,
                        ));
                    }
                    self.header = None;
                    Ok(self.token(TokenKind::RBracketDouble, start))
                } else {
                    self.header = None;
                    Ok(self.token(TokenKind::RBracket, start))
                }
            }
            b'"' | b'\'' => self.string_token(b, start, true),
            _ if is_keylike(b) => {
                let name = self.read_keylike();
                Ok(self.token(TokenKind::KeyBare(name), start))
            }
            _ => Err(self.rd.error_at(
                ParseErrorKind::Expected {
                    expected: "a table key",
                    found: self.describe_at(start),
                },
                start,
                start + 1,
            )),
        }
    }

    // ---- value position --------------------------------------------------

    fn value_token(&mut self, start: usize) -> Result<Token<'s>, ParseError> {
        let b = self.rd.peek().expect("caller checked non-eof");
        match b {
            b'"' | b'\'' => self.string_token(b, start, false),
            b'{' => {
                self.rd.bump();
                self.scopes.push(Scope::InlineTable);
                self.expect_value = false;
                Ok(self.token(TokenKind::LBrace, start))
            }
            b'[' => {
                self.rd.bump();
                self.scopes.push(Scope::Array);
                Ok(self.token(TokenKind::LBracket, start))
            }
            b']' if self.scopes.last() == Some(&Scope::Array) => {
                self.rd.bump();
                self.scopes.pop();
                self.after_value();
                Ok(self.token(TokenKind::RBracket, start))
            }
            b',' if self.scopes.last() == Some(&Scope::Array) => {
                self.rd.bump();
                Ok(self.token(TokenKind::Comma, start))
            }
            b'0'..=b'9' | b'+' | b'-' => self.number_token(start),
            _ if is_keylike(b) => self.word_token(start),
            _ => Err(self.rd.error_at(
                ParseErrorKind::Expected {
                    expected: "a value",
                    found: self.describe_at(start),
                },
                start,
                start + 1,
            )),
        }
    }

    /// A bare word in value position: `true`, `false`, `inf`, `nan`, or an
    /// error naming whatever else was found.
    fn word_token(&mut self, start: usize) -> Result<Token<'s>, ParseError> {
        let word = self.read_keylike();
        let kind = match word {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "inf" => TokenKind::Float(f64::INFINITY),
            "nan" => TokenKind::Float(f64::NAN),
            _ => {
                return Err(self.rd.error_at(
                    ParseErrorKind::Expected {
                        expected: "a value",
                        found: format!("'{word}'").into(),
                    },
                    start,
                    self.rd.pos(),
                ));
            }
        };
        self.after_value();
        Ok(self.token(kind, start))
    }

    fn number_token(&mut self, start: usize) -> Result<Token<'s>, ParseError> {
        let sign = match self.rd.peek() {
            Some(b'-') => {
                self.rd.bump();
                Some('-')
            }
            Some(b'+') => {
                self.rd.bump();
                Some('+')
            }
            _ => {
                // Datetimes are unsigned; probe before number parsing so a
                // date's interior `-` never reaches the integer rules.
                if let Some((consumed, parts)) = time::scan(self.rd.rest()) {
                    self.rd.advance(consumed);
                    self.after_value();
                    return Ok(self.token(TokenKind::Datetime(parts), start));
                }
                None
            }
        };
        let negative = sign == Some('-');

        let word = self.read_keylike();
        let end = self.rd.pos();

        if word.is_empty() {
            return Err(self.rd.error_at(
                ParseErrorKind::Expected {
                    expected: "a digit",
                    found: self.describe_at(end),
                },
                start,
                end + 1,
            ));
        }

        // Signed specials and their malformed cousins.
        match word {
            "inf" => {
                let f = if negative { f64::NEG_INFINITY } else { f64::INFINITY };
                self.after_value();
                return Ok(self.token(TokenKind::Float(f), start));
            }
            "nan" => {
                let f = if negative {
                    f64::NAN.copysign(-1.0)
                } else {
                    f64::NAN.copysign(1.0)
                };
                self.after_value();
                return Ok(self.token(TokenKind::Float(f), start));
            }
            _ => {}
        }
        if let Some(sign) = sign {
            if !word.as_bytes()[0].is_ascii_digit() {
                let first = word.as_bytes()[0];
                if first == b'i' || first == b'n' {
                    return Err(self.rd.error_at(
                        ParseErrorKind::InvalidFloat(format!("{sign}{word}")),
                        start,
                        end,
                    ));
                }
                return Err(self.rd.error_at(
                    ParseErrorKind::Expected {
                        expected: "a digit",
                        found: format!("'{word}'").into(),
                    },
                    start,
                    end,
                ));
            }
        } else if self.rd.peek() == Some(b':')
            || (word.len() > 4 && word.as_bytes()[4] == b'-')
        {
            // Shaped like a time or date but the munch refused it.
            return Err(self
                .rd
                .error_at(ParseErrorKind::InvalidDatetime(word.into()), start, end));
        }

        // Base-prefixed integers.
        if word.len() >= 2 && word.as_bytes()[0] == b'0' {
            let prefix = word.as_bytes()[1];
            if matches!(prefix, b'B' | b'O' | b'X') {
                return Err(self.rd.error_at(
                    ParseErrorKind::UppercaseBasePrefix(prefix as char),
                    start,
                    end,
                ));
            }
            if matches!(prefix, b'x' | b'o' | b'b') {
                if let Some(sign) = sign {
                    return Err(self.rd.error_at(
                        ParseErrorKind::SignedNonDecimal(format!("{sign}0{}", prefix as char)),
                        start,
                        end,
                    ));
                }
                let shift = match prefix {
                    b'x' => 4,
                    b'o' => 3,
                    _ => 1,
                };
                let value = parse_radix(&word[2..], shift, word)
                    .map_err(|kind| self.rd.error_at(kind, start, end))?;
                self.after_value();
                return Ok(self.token(TokenKind::Integer(value), start));
            }
        }

        // Fractional part.
        let frac = if self.rd.eat(b'.') {
            let frac = self.read_keylike();
            if !frac.as_bytes().first().is_some_and(|b| b.is_ascii_digit()) {
                return Err(self.rd.error_at(
                    ParseErrorKind::InvalidFloat(format!("{word}.{frac}")),
                    start,
                    self.rd.pos(),
                ));
            }
            Some(frac)
        } else {
            None
        };

        // When a token ends in `e`/`E` the exponent's `+` and digits are
        // separate; stitch them back on. (`-` is keylike, so `1e-5` never
        // splits.)
        let tail = frac.unwrap_or(word);
        let exp = if tail.ends_with(['e', 'E']) {
            self.rd.eat(b'+');
            let exp = self.read_keylike();
            if !exp.as_bytes().first().is_some_and(|b| b.is_ascii_digit()) {
                return Err(self.rd.error_at(
                    ParseErrorKind::InvalidFloat(self.rd.slice(start, self.rd.pos()).into()),
                    start,
                    self.rd.pos(),
                ));
            }
            Some(exp)
        } else {
            None
        };

        let end = self.rd.pos();
        let is_float =
            frac.is_some() || exp.is_some() || word.contains('e') || word.contains('E');

        if is_float {
            let mut text = String::with_capacity(word.len() + 8);
            if negative {
                text.push('-');
            }
            text.push_str(word);
            if let Some(frac) = frac {
                text.push('.');
                text.push_str(frac);
            }
            if let Some(exp) = exp {
                text.push_str(exp);
            }
            let value =
                parse_float(&text, word).map_err(|kind| self.rd.error_at(kind, start, end))?;
            // A float may not run into another `.` (e.g. `0.1.2`).
            if self.rd.peek() == Some(b'.') {
                return Err(self.rd.error_at(
                    ParseErrorKind::InvalidFloat(text),
                    start,
                    end + 1,
                ));
            }
            self.after_value();
            return Ok(self.token(TokenKind::Float(value), start));
        }

        let value =
            parse_decimal(word, negative).map_err(|kind| self.rd.error_at(kind, start, end))?;
        if self.rd.peek() == Some(b'.') {
            return Err(self.rd.error_at(
                ParseErrorKind::InvalidFloat(word.into()),
                start,
                end + 1,
            ));
        }
        self.after_value();
        Ok(self.token(TokenKind::Integer(value), start))
    }

    // ---- strings ---------------------------------------------------------

    /// Lexes any of the four string forms. `for_key` selects key-segment
    /// classification (where multiline forms are rejected).
    fn string_token(&mut self, delim: u8, start: usize, for_key: bool) -> Result<Token<'s>, ParseError> {
        self.rd.bump();
        let mut multiline = false;
        if self.rd.eat(delim) {
            if self.rd.eat(delim) {
                multiline = true;
            } else {
                // Empty single-line string.
                let span = Span::new((start + 1) as u32, (start + 1) as u32);
                return self.finish_string(Cow::Borrowed(""), delim, false, for_key, start, span);
            }
        }

        let mut content_start = self.rd.pos();
        if multiline && self.rd.eat_newline() {
            content_start = self.rd.pos();
        }

        let mut buf: Option<String> = None;
        let mut flush_from = content_start;
        loop {
            let i = self.rd.pos();
            let Some(b) = self.rd.peek() else {
                return Err(self.rd.error_at(
                    ParseErrorKind::UnexpectedEof {
                        expected: closing_delimiter(delim, multiline),
                    },
                    start,
                    i,
                ));
            };
            self.rd.bump();
            match b {
                b'\r' => {
                    if self.rd.eat(b'\n') {
                        if !multiline {
                            return Err(self.rd.error_at(
                                ParseErrorKind::ControlChar('\n'),
                                i,
                                i + 2,
                            ));
                        }
                        // \r\n stays in multiline content verbatim.
                    } else {
                        return Err(self.rd.error_at(
                            ParseErrorKind::ControlChar('\r'),
                            i,
                            i + 1,
                        ));
                    }
                }
                b'\n' => {
                    if !multiline {
                        return Err(self.rd.error_at(
                            ParseErrorKind::ControlChar('\n'),
                            i,
                            i + 1,
                        ));
                    }
                }
                d if d == delim => {
                    let content_end = if multiline {
                        if !self.rd.eat(delim) {
                            continue;
                        }
                        if !self.rd.eat(delim) {
                            continue;
                        }
                        // Up to two further delimiters belong to the content
                        // (`""""""` endings).
                        let mut extra = 0;
                        if self.rd.eat(delim) {
                            extra += 1;
                        }
                        if self.rd.eat(delim) {
                            extra += 1;
                        }
                        i + extra
                    } else {
                        i
                    };
                    let span = Span::new(content_start as u32, content_end as u32);
                    let content = match buf {
                        Some(mut s) => {
                            s.push_str(self.rd.slice(flush_from, content_end));
                            Cow::Owned(s)
                        }
                        None => Cow::Borrowed(self.rd.slice(content_start, content_end)),
                    };
                    return self.finish_string(content, delim, multiline, for_key, start, span);
                }
                b'\\' if delim == b'"' => {
                    let mut scratch = buf.take().unwrap_or_default();
                    scratch.push_str(self.rd.slice(flush_from, i));
                    self.basic_escape(&mut scratch, start, multiline)?;
                    flush_from = self.rd.pos();
                    buf = Some(scratch);
                }
                0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F | 0x7F => {
                    return Err(self.rd.error_at(
                        ParseErrorKind::ControlChar(b as char),
                        i,
                        i + 1,
                    ));
                }
                // Tab, printable ASCII, multi-byte UTF-8, and backslash in
                // literal strings.
                _ => {}
            }
        }
    }

    fn finish_string(
        &mut self,
        content: Cow<'s, str>,
        delim: u8,
        multiline: bool,
        for_key: bool,
        start: usize,
        span: Span,
    ) -> Result<Token<'s>, ParseError> {
        if for_key {
            if multiline {
                return Err(self.rd.error_at(
                    ParseErrorKind::MultilineKey,
                    start,
                    self.rd.pos(),
                ));
            }
            return Ok(Token {
                kind: TokenKind::KeyQuoted(content),
                span,
            });
        }
        let kind = match (delim, multiline) {
            (b'"', false) => TokenKind::String(content),
            (b'"', true) => TokenKind::MultilineString(content),
            (_, false) => TokenKind::LiteralString(content),
            (_, true) => TokenKind::MultilineLiteralString(content),
        };
        self.after_value();
        Ok(Token { kind, span })
    }

    /// Decodes one backslash escape (cursor sits just past the backslash),
    /// appending to `scratch`. A backslash at the end of a multiline line
    /// consumes the line break and all following whitespace.
    fn basic_escape(
        &mut self,
        scratch: &mut String,
        string_start: usize,
        multi: bool,
    ) -> Result<(), ParseError> {
        let i = self.rd.pos();
        let Some(b) = self.rd.peek() else {
            return Err(self.rd.error_at(
                ParseErrorKind::UnexpectedEof {
                    expected: closing_delimiter(b'"', multi),
                },
                string_start,
                i,
            ));
        };
        self.rd.bump();
        match b {
            b'"' => scratch.push('"'),
            b'\\' => scratch.push('\\'),
            b'b' => scratch.push('\u{0008}'),
            b'f' => scratch.push('\u{000C}'),
            b'n' => scratch.push('\n'),
            b'r' => scratch.push('\r'),
            b't' => scratch.push('\t'),
            b'u' => scratch.push(self.hex_escape(4, string_start, i)?),
            b'U' => scratch.push(self.hex_escape(8, string_start, i)?),
            b' ' | b'\t' | b'\n' | b'\r' if multi => {
                // Line continuation. Whitespace may sit between the
                // backslash and the line break, but something other than
                // whitespace there makes the escape invalid.
                let c = if b == b'\r' {
                    if !self.rd.eat(b'\n') {
                        return Err(self.rd.error_at(
                            ParseErrorKind::ControlChar('\r'),
                            i,
                            i + 1,
                        ));
                    }
                    '\n'
                } else {
                    b as char
                };
                if c != '\n' {
                    loop {
                        match self.rd.peek() {
                            Some(b' ' | b'\t') => self.rd.bump(),
                            Some(b'\n') => {
                                self.rd.bump();
                                break;
                            }
                            Some(b'\r') if self.rd.peek_at(1) == Some(b'\n') => {
                                self.rd.advance(2);
                                break;
                            }
                            _ => {
                                return Err(self.rd.error_at(
                                    ParseErrorKind::InvalidEscape(c),
                                    i,
                                    i + 1,
                                ));
                            }
                        }
                    }
                }
                // Swallow all whitespace after the break, including
                // further newlines.
                loop {
                    match self.rd.peek() {
                        Some(b' ' | b'\t' | b'\n') => self.rd.bump(),
                        Some(b'\r') if self.rd.peek_at(1) == Some(b'\n') => self.rd.advance(2),
                        _ => break,
                    }
                }
            }
            _ => {
                return Err(self.rd.error_at(
                    ParseErrorKind::InvalidEscape(self.rd.char_at(i)),
                    i,
                    i + 1,
                ));
            }
        }
        Ok(())
    }

    fn hex_escape(
        &mut self,
        n: usize,
        string_start: usize,
        escape_start: usize,
    ) -> Result<char, ParseError> {
        let mut val: u32 = 0;
        for _ in 0..n {
            let Some(b) = self.rd.peek() else {
                return Err(self.rd.error_at(
                    ParseErrorKind::UnexpectedEof {
                        expected: "a hex digit",
                    },
                    string_start,
                    self.rd.pos(),
                ));
            };
            match (b as char).to_digit(16) {
                Some(d) => {
                    val = (val << 4) | d;
                    self.rd.bump();
                }
                None => {
                    let at = self.rd.pos();
                    return Err(self.rd.error_at(
                        ParseErrorKind::InvalidHexEscape(self.rd.char_at(at)),
                        at,
                        at + 1,
                    ));
                }
            }
        }
        char::from_u32(val).ok_or_else(|| {
            self.rd.error_at(
                ParseErrorKind::InvalidEscapeValue(val),
                escape_start,
                escape_start + 1 + n,
            )
        })
    }
}

fn closing_delimiter(delim: u8, multiline: bool) -> &'static str {
    if delim == b'"' {
        if multiline {
            "'\"\"\"'"
        } else {
            "'\"'"
        }
    } else if multiline {
        "\"'''\""
    } else {
        "\"'\""
    }
}

/// Decimal integer per TOML rules: optional sign handled by the caller, no
/// leading zeros, `_` only between digits, must fit in `i64` (with `-2^63`
/// reachable only through the negative path).
fn parse_decimal(text: &str, negative: bool) -> Result<i64, ParseErrorKind> {
    let mut acc: u64 = 0;
    let mut prev_underscore = false;
    let mut has_digit = false;
    let mut leading_zero = false;
    for &b in text.as_bytes() {
        if b == b'_' {
            if !has_digit || prev_underscore {
                return Err(ParseErrorKind::UnderscorePlacement);
            }
            prev_underscore = true;
            continue;
        }
        if !b.is_ascii_digit() {
            return Err(ParseErrorKind::InvalidInteger(text.into()));
        }
        if leading_zero {
            return Err(ParseErrorKind::LeadingZero);
        }
        if !has_digit && b == b'0' {
            leading_zero = true;
        }
        has_digit = true;
        prev_underscore = false;
        acc = match acc
            .checked_mul(10)
            .and_then(|a| a.checked_add((b - b'0') as u64))
        {
            Some(v) => v,
            None => return Err(ParseErrorKind::IntegerTooLarge(text.into())),
        };
    }
    if !has_digit {
        return Err(ParseErrorKind::InvalidInteger(text.into()));
    }
    if prev_underscore {
        return Err(ParseErrorKind::UnderscorePlacement);
    }
    let max = if negative {
        (i64::MAX as u64) + 1
    } else {
        i64::MAX as u64
    };
    if acc > max {
        return Err(ParseErrorKind::IntegerTooLarge(text.into()));
    }
    Ok(if negative {
        (acc as i64).wrapping_neg()
    } else {
        acc as i64
    })
}

/// Hex/octal/binary digits after the base prefix. `shift` is the bit width
/// of one digit.
fn parse_radix(digits: &str, shift: u32, full: &str) -> Result<i64, ParseErrorKind> {
    let radix = 1u32 << shift;
    let mut acc: u64 = 0;
    let mut prev_underscore = false;
    let mut has_digit = false;
    if digits.is_empty() {
        return Err(ParseErrorKind::InvalidInteger(full.into()));
    }
    for &b in digits.as_bytes() {
        if b == b'_' {
            if !has_digit || prev_underscore {
                return Err(ParseErrorKind::UnderscorePlacement);
            }
            prev_underscore = true;
            continue;
        }
        let Some(d) = (b as char).to_digit(radix) else {
            return Err(ParseErrorKind::InvalidInteger(full.into()));
        };
        has_digit = true;
        prev_underscore = false;
        if acc >> (64 - shift) != 0 {
            return Err(ParseErrorKind::IntegerTooLarge(full.into()));
        }
        acc = (acc << shift) | d as u64;
    }
    if prev_underscore {
        return Err(ParseErrorKind::UnderscorePlacement);
    }
    if acc > i64::MAX as u64 {
        return Err(ParseErrorKind::IntegerTooLarge(full.into()));
    }
    Ok(acc as i64)
}

/// Validates and parses an assembled float literal (sign included,
/// underscores still present). `int_part` is the digits before any `.`/`e`,
/// for the leading-zero rule.
fn parse_float(text: &str, int_part: &str) -> Result<f64, ParseErrorKind> {
    if let [b'0', b'0'..=b'9' | b'_', ..] = int_part.as_bytes() {
        return Err(ParseErrorKind::LeadingZero);
    }
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'_' {
            let prev = i > 0 && bytes[i - 1].is_ascii_digit();
            let next = bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit());
            if !prev || !next {
                return Err(ParseErrorKind::UnderscorePlacement);
            }
        }
    }
    let stripped: String = text.chars().filter(|&c| c != '_').collect();
    match stripped.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(f),
        _ => Err(ParseErrorKind::InvalidFloat(text.into())),
    }
}
