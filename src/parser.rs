//! The parser: consumes the token stream into a root [`Table`] plus
//! [`MetaData`], enforcing TOML's structural rules.
//!
//! The current section is tracked as a key-path list and re-resolved from
//! the root per statement; tables remember how they were created (header,
//! dotted key, inline expression, array entry) and those flags decide
//! whether a later statement may extend them.

#[cfg(test)]
#[path = "./parser_tests.rs"]
mod tests;

use crate::array::Array;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::meta::{KeyPath, MetaData, TomlType};
use crate::span::Span;
use crate::table::{flavor, Table};
use crate::time::DatetimeParts;
use crate::value::{Key, Value, ValueKind};

const MAX_RECURSION_DEPTH: i16 = 256;

/// Error data produced while a navigation borrow is still alive; the parser
/// attaches line and last-key context once the borrow ends.
type Structural = (ParseErrorKind, Span);

/// Parses a document into its root table and metadata.
pub(crate) fn parse_document(input: &str) -> Result<(Value, MetaData), ParseError> {
    let len = input.len() as u32;
    let mut parser = Parser {
        lx: Lexer::new(input)?,
        peeked: None,
        root: Table::new(),
        meta: MetaData::default(),
        section: Vec::new(),
        last_key: String::new(),
    };
    parser.run()?;
    let Parser { root, meta, .. } = parser;
    Ok((Value::table(root, Span::new(0, len)), meta))
}

struct Parser<'s> {
    lx: Lexer<'s>,
    peeked: Option<Token<'s>>,
    root: Table,
    meta: MetaData,
    /// Path of the current `[section]` / `[[section]]`; empty at the root.
    section: Vec<String>,
    /// Most recent key being parsed, dotted, for error context.
    last_key: String,
}

impl<'s> Parser<'s> {
    fn next(&mut self) -> Result<Token<'s>, ParseError> {
        match self.peeked.take() {
            Some(t) => Ok(t),
            None => self
                .lx
                .next()
                .map_err(|e| e.with_last_key(&self.last_key)),
        }
    }

    fn peek(&mut self) -> Result<&Token<'s>, ParseError> {
        if self.peeked.is_none() {
            let tok = self
                .lx
                .next()
                .map_err(|e| e.with_last_key(&self.last_key))?;
            self.peeked = Some(tok);
        }
        Ok(self.peeked.as_ref().expect("just filled"))
    }

    fn err(&self, kind: ParseErrorKind, span: Span) -> ParseError {
        self.lx
            .reader()
            .error(kind, span)
            .with_last_key(&self.last_key)
    }

    fn err_structural(&self, (kind, span): Structural) -> ParseError {
        self.err(kind, span)
    }

    fn run(&mut self) -> Result<(), ParseError> {
        loop {
            let tok = self.next()?;
            match tok.kind {
                TokenKind::Newline => continue,
                TokenKind::Eof => return Ok(()),
                TokenKind::LBracket => self.header(false, tok.span)?,
                TokenKind::LBracketDouble => self.header(true, tok.span)?,
                TokenKind::KeyBare(_) | TokenKind::KeyQuoted(_) => self.keyval(tok)?,
                other => {
                    return Err(self.err(
                        ParseErrorKind::Expected {
                            expected: "a key or table header",
                            found: other.describe(),
                        },
                        tok.span,
                    ));
                }
            }
        }
    }

    fn key_from(&self, tok: Token<'s>) -> Result<Key, ParseError> {
        match tok.kind {
            TokenKind::KeyBare(s) => Ok(Key {
                name: s.to_owned(),
                span: tok.span,
            }),
            TokenKind::KeyQuoted(s) => Ok(Key {
                name: s.into_owned(),
                span: tok.span,
            }),
            TokenKind::Eof => Err(self.err(
                ParseErrorKind::UnexpectedEof {
                    expected: "a table key",
                },
                tok.span,
            )),
            other => Err(self.err(
                ParseErrorKind::Expected {
                    expected: "a table key",
                    found: other.describe(),
                },
                tok.span,
            )),
        }
    }

    /// Reads `key ("." key)*` until `stop`, returning the segments.
    fn dotted_key(&mut self, first: Token<'s>, stop: Stop) -> Result<Vec<Key>, ParseError> {
        let mut segments = vec![self.key_from(first)?];
        loop {
            let tok = self.next()?;
            match (&tok.kind, stop) {
                (TokenKind::Dot, _) => {
                    let key_tok = self.next()?;
                    segments.push(self.key_from(key_tok)?);
                }
                (TokenKind::Equals, Stop::Equals) => return Ok(segments),
                (TokenKind::RBracket, Stop::RBracket) => return Ok(segments),
                (TokenKind::RBracketDouble, Stop::RBracketDouble) => return Ok(segments),
                (TokenKind::Eof, _) => {
                    return Err(self.err(
                        ParseErrorKind::UnexpectedEof {
                            expected: stop.expected(),
                        },
                        tok.span,
                    ));
                }
                (other, _) => {
                    return Err(self.err(
                        ParseErrorKind::Expected {
                            expected: stop.expected(),
                            found: other.describe(),
                        },
                        tok.span,
                    ));
                }
            }
        }
    }

    /// Requires the statement terminator: a newline or the end of input.
    fn end_statement(&mut self) -> Result<(), ParseError> {
        let tok = self.next()?;
        match tok.kind {
            TokenKind::Newline | TokenKind::Eof => Ok(()),
            other => Err(self.err(
                ParseErrorKind::Expected {
                    expected: "a newline",
                    found: other.describe(),
                },
                tok.span,
            )),
        }
    }

    fn keyval(&mut self, first: Token<'s>) -> Result<(), ParseError> {
        let segments = self.dotted_key(first, Stop::Equals)?;
        self.last_key = display_path(self.section.iter().map(String::as_str), &segments);

        let value = self.parse_value(MAX_RECURSION_DEPTH)?;
        self.end_statement()?;

        assign_keyval(
            &mut self.root,
            &mut self.meta,
            &self.section,
            segments,
            value,
        )
        .map_err(|e| self.err_structural(e))
    }

    fn header(&mut self, is_array: bool, open_span: Span) -> Result<(), ParseError> {
        let first = self.next()?;
        let stop = if is_array {
            Stop::RBracketDouble
        } else {
            Stop::RBracket
        };
        let segments = self.dotted_key(first, stop)?;
        self.last_key = display_path(std::iter::empty::<&str>(), &segments);
        self.end_statement()?;

        let header_span = Span::new(open_span.start, self.lx.reader().pos() as u32);
        let section = apply_header(
            &mut self.root,
            &mut self.meta,
            segments,
            is_array,
            header_span,
        )
        .map_err(|e| self.err_structural(e))?;
        self.section = section;
        Ok(())
    }

    // ---- values ----------------------------------------------------------

    fn parse_value(&mut self, depth: i16) -> Result<Value, ParseError> {
        let tok = self.next()?;
        let span = tok.span;
        let kind = match tok.kind {
            TokenKind::String(s)
            | TokenKind::MultilineString(s)
            | TokenKind::LiteralString(s)
            | TokenKind::MultilineLiteralString(s) => ValueKind::String(s.into_owned()),
            TokenKind::Integer(i) => ValueKind::Integer(i),
            TokenKind::Float(f) => ValueKind::Float(f),
            TokenKind::Bool(b) => ValueKind::Boolean(b),
            TokenKind::Datetime(parts) => datetime_kind(parts),
            TokenKind::LBracket => return self.parse_array(span, depth - 1),
            TokenKind::LBrace => return self.parse_inline_table(span, depth - 1),
            TokenKind::Eof => {
                return Err(self.err(
                    ParseErrorKind::UnexpectedEof {
                        expected: "a value",
                    },
                    span,
                ));
            }
            other => {
                return Err(self.err(
                    ParseErrorKind::Expected {
                        expected: "a value",
                        found: other.describe(),
                    },
                    span,
                ));
            }
        };
        Ok(Value::new(kind, span))
    }

    fn parse_array(&mut self, open_span: Span, depth: i16) -> Result<Value, ParseError> {
        if depth < 0 {
            return Err(self.err(ParseErrorKind::RecursionLimit, open_span));
        }
        let mut arr = Array::new();
        loop {
            if matches!(self.peek()?.kind, TokenKind::RBracket) {
                let tok = self.next()?;
                let span = Span::new(open_span.start, tok.span.end);
                return Ok(Value::array(arr, span));
            }
            arr.push(self.parse_value(depth)?);

            let tok = self.next()?;
            match tok.kind {
                TokenKind::Comma => continue,
                TokenKind::RBracket => {
                    let span = Span::new(open_span.start, tok.span.end);
                    return Ok(Value::array(arr, span));
                }
                TokenKind::Eof => {
                    return Err(self.err(
                        ParseErrorKind::UnexpectedEof {
                            expected: "a comma or array terminator ']'",
                        },
                        tok.span,
                    ));
                }
                other => {
                    return Err(self.err(
                        ParseErrorKind::Expected {
                            expected: "a comma or array terminator ']'",
                            found: other.describe(),
                        },
                        tok.span,
                    ));
                }
            }
        }
    }

    fn parse_inline_table(&mut self, open_span: Span, depth: i16) -> Result<Value, ParseError> {
        if depth < 0 {
            return Err(self.err(ParseErrorKind::RecursionLimit, open_span));
        }
        let mut table = Table::with_flavor(flavor::INLINE);
        if matches!(self.peek()?.kind, TokenKind::RBrace) {
            let tok = self.next()?;
            let span = Span::new(open_span.start, tok.span.end);
            return Ok(Value::table(table, span));
        }
        loop {
            let first = self.next()?;
            let segments = self.dotted_key(first, Stop::Equals)?;
            let value = self.parse_value(depth)?;
            insert_dotted(&mut table, segments, value, flavor::INLINE | flavor::DOTTED)
                .map_err(|e| self.err_structural(e))?;

            let tok = self.next()?;
            match tok.kind {
                TokenKind::Comma => continue,
                TokenKind::RBrace => {
                    let span = Span::new(open_span.start, tok.span.end);
                    return Ok(Value::table(table, span));
                }
                TokenKind::Eof => {
                    return Err(self.err(
                        ParseErrorKind::UnexpectedEof {
                            expected: "a comma or an inline table terminator '}'",
                        },
                        tok.span,
                    ));
                }
                other => {
                    return Err(self.err(
                        ParseErrorKind::Expected {
                            expected: "a comma or an inline table terminator '}'",
                            found: other.describe(),
                        },
                        tok.span,
                    ));
                }
            }
        }
    }
}

/// What ends a dotted-key sequence.
#[derive(Copy, Clone, PartialEq)]
enum Stop {
    Equals,
    RBracket,
    RBracketDouble,
}

impl Stop {
    fn expected(self) -> &'static str {
        match self {
            Stop::Equals => "key separator '='",
            Stop::RBracket => "'.' or ']'",
            Stop::RBracketDouble => "'.' or ']]'",
        }
    }
}

fn datetime_kind(parts: DatetimeParts) -> ValueKind {
    match parts {
        DatetimeParts {
            date: Some(date),
            time: Some(time),
            offset: Some(offset),
        } => ValueKind::Datetime(crate::time::Datetime { date, time, offset }),
        DatetimeParts {
            date: Some(date),
            time: Some(time),
            offset: None,
        } => ValueKind::LocalDatetime(crate::time::LocalDatetime { date, time }),
        DatetimeParts {
            date: Some(date),
            time: None,
            ..
        } => ValueKind::LocalDate(date),
        DatetimeParts {
            date: None,
            time: Some(time),
            ..
        } => ValueKind::LocalTime(time),
        // The scanner never yields a partless result.
        DatetimeParts {
            date: None,
            time: None,
            ..
        } => unreachable!("datetime scan produced no parts"),
    }
}

/// Renders `prefix..segments` the way error messages and MetaData address
/// keys: dotted, quoting non-bare segments.
fn display_path<'a>(prefix: impl Iterator<Item = &'a str>, segments: &[Key]) -> String {
    let path: KeyPath = prefix
        .map(str::to_owned)
        .chain(segments.iter().map(|k| k.name.clone()))
        .collect();
    path.to_string()
}

fn duplicate_key(section: &[String], segments: &[Key], upto: usize) -> ParseErrorKind {
    let path: KeyPath = section
        .iter()
        .cloned()
        .chain(segments[..=upto].iter().map(|k| k.name.clone()))
        .collect();
    ParseErrorKind::DuplicateKey(path.to_string())
}

/// Resolves the table a section path points at. Every segment was created
/// by a previous header, so the walk cannot fail; array-of-tables segments
/// resolve to their most recent entry.
fn section_table<'t>(root: &'t mut Table, path: &[String]) -> &'t mut Table {
    let mut cur = root;
    for seg in path {
        let val = cur
            .get_mut(seg)
            .expect("section path segments exist once the header is applied");
        cur = match val.kind_mut() {
            ValueKind::Table(t) => t,
            ValueKind::Array(a) => a
                .last_mut()
                .and_then(Value::as_table_mut)
                .expect("an array of tables always ends with a table entry"),
            _ => unreachable!("section path segment is neither table nor array of tables"),
        };
    }
    cur
}

/// Walks or creates one intermediate segment of a dotted key.
///
/// New tables get `new_flavor` (DOTTED at the top level, INLINE|DOTTED
/// inside an inline expression). Existing tables must be extendable:
/// inline tables are frozen and header tables may not be reopened through
/// dotted keys.
fn navigate_dotted<'t>(
    table: &'t mut Table,
    key: &Key,
    new_flavor: u8,
    path: impl FnOnce() -> String,
) -> Result<&'t mut Table, Structural> {
    if let Some(idx) = table.find_index(&key.name) {
        let (_, val) = &mut table.entries_mut()[idx];
        let span = key.span;
        return match val.kind_mut() {
            // An inline value table is closed at its own `}`. A table the
            // same inline expression created through a dotted key stays
            // open until the expression ends (it carries DOTTED too).
            ValueKind::Table(t) if t.is_inline() && !t.is_dotted() => {
                Err((ParseErrorKind::ExtendInlineTable(path()), span))
            }
            ValueKind::Table(t) if t.is_explicit() => {
                Err((ParseErrorKind::DuplicateKey(path()), span))
            }
            ValueKind::Table(t) => Ok(t),
            _ => Err((ParseErrorKind::DottedKeyInvalidType(path()), span)),
        };
    }
    let span = key.span;
    let val = table.insert(
        key.clone(),
        Value::table(Table::with_flavor(new_flavor), span),
    );
    Ok(val.as_table_mut().expect("just inserted a table"))
}

/// Installs `value` at the dotted `segments` inside `table`, creating
/// intermediate tables with `new_flavor`.
fn insert_dotted(
    table: &mut Table,
    segments: Vec<Key>,
    value: Value,
    new_flavor: u8,
) -> Result<(), Structural> {
    let mut cur = table;
    let last = segments.len() - 1;
    for (i, seg) in segments[..last].iter().enumerate() {
        cur = navigate_dotted(cur, seg, new_flavor, || {
            duplicate_path(&segments, i)
        })?;
    }
    let key = &segments[last];
    if cur.contains_key(&key.name) {
        return Err((
            ParseErrorKind::DuplicateKey(duplicate_path(&segments, last)),
            key.span,
        ));
    }
    let key = key.clone();
    cur.insert(key, value);
    Ok(())
}

fn duplicate_path(segments: &[Key], upto: usize) -> String {
    let path: KeyPath = segments[..=upto].iter().map(|k| k.name.clone()).collect();
    path.to_string()
}

/// The §key-assignment algorithm for a `a.b.c = v` statement in the current
/// section, plus MetaData recording.
fn assign_keyval(
    root: &mut Table,
    meta: &mut MetaData,
    section: &[String],
    segments: Vec<Key>,
    value: Value,
) -> Result<(), Structural> {
    let mut cur = section_table(root, section);
    let last = segments.len() - 1;
    for (i, seg) in segments[..last].iter().enumerate() {
        cur = navigate_dotted(cur, seg, flavor::DOTTED, || {
            let path: KeyPath = section
                .iter()
                .cloned()
                .chain(segments[..=i].iter().map(|k| k.name.clone()))
                .collect();
            path.to_string()
        })?;
    }
    let key = &segments[last];
    if cur.contains_key(&key.name) {
        return Err((duplicate_key(section, &segments, last), key.span));
    }

    let mut path: KeyPath = section
        .iter()
        .cloned()
        .chain(segments.iter().map(|k| k.name.clone()))
        .collect();
    record_value(meta, &mut path, &value);

    let key = key.clone();
    cur.insert(key, value);
    Ok(())
}

/// Records a leaf assignment. Inline table values also record their inner
/// keys (they are leaf assignments of the same statement); array contents
/// are addressed only through the array itself.
fn record_value(meta: &mut MetaData, path: &mut KeyPath, value: &Value) {
    meta.record(path.clone(), TomlType::of_value(value.kind()));
    if let ValueKind::Table(t) = value.kind() {
        for (k, v) in t {
            path.push(&k.name);
            record_value(meta, path, v);
            path.pop();
        }
    }
}

/// Walks or creates one intermediate segment of a `[header]` path.
/// Missing tables become implicit (no flags); array-of-tables segments
/// resolve to their most recent entry.
fn navigate_header<'t>(
    table: &'t mut Table,
    key: &Key,
    path: impl FnOnce() -> String,
) -> Result<&'t mut Table, Structural> {
    if let Some(idx) = table.find_index(&key.name) {
        let (_, val) = &mut table.entries_mut()[idx];
        let span = key.span;
        return match val.kind_mut() {
            ValueKind::Table(t) if t.is_inline() => {
                Err((ParseErrorKind::DuplicateKey(path()), span))
            }
            ValueKind::Table(t) => Ok(t),
            ValueKind::Array(a) if a.array_of_tables => Ok(a
                .last_mut()
                .and_then(Value::as_table_mut)
                .expect("an array of tables always ends with a table entry")),
            _ => Err((ParseErrorKind::DuplicateKey(path()), span)),
        };
    }
    let span = key.span;
    let val = table.insert(key.clone(), Value::table(Table::new(), span));
    Ok(val.as_table_mut().expect("just inserted a table"))
}

/// Applies a `[a.b]` or `[[a.b]]` header: resolves the path, enforces the
/// redefinition rules, records metadata, and returns the new current
/// section path.
fn apply_header(
    root: &mut Table,
    meta: &mut MetaData,
    segments: Vec<Key>,
    is_array: bool,
    header_span: Span,
) -> Result<Vec<String>, Structural> {
    let mut cur: &mut Table = root;
    let last = segments.len() - 1;
    for (i, seg) in segments[..last].iter().enumerate() {
        cur = navigate_header(cur, seg, || duplicate_path(&segments, i))?;
    }
    let key = &segments[last];
    let path = || duplicate_path(&segments, last);

    if is_array {
        apply_array_header(cur, key, header_span, path)?;
        meta.record(key_path(&segments), TomlType::ArrayHash);
    } else {
        apply_table_header(cur, key, header_span, path)?;
        meta.record(key_path(&segments), TomlType::Hash);
    }
    Ok(segments.into_iter().map(|k| k.name).collect())
}

fn key_path(segments: &[Key]) -> KeyPath {
    segments.iter().map(|k| k.name.clone()).collect()
}

fn apply_table_header(
    table: &mut Table,
    key: &Key,
    header_span: Span,
    path: impl Fn() -> String,
) -> Result<(), Structural> {
    if let Some(idx) = table.find_index(&key.name) {
        let (_, val) = &mut table.entries_mut()[idx];
        return match val.kind_mut() {
            ValueKind::Table(t) if t.is_inline() || t.is_dotted() => {
                Err((ParseErrorKind::DuplicateKey(path()), key.span))
            }
            ValueKind::Table(t) if t.is_explicit() => {
                Err((ParseErrorKind::DuplicateTable(path()), header_span))
            }
            ValueKind::Table(t) => {
                // Implicit table promoted to explicit, exactly once.
                t.flavor |= flavor::EXPLICIT;
                Ok(())
            }
            _ => Err((ParseErrorKind::DuplicateKey(path()), key.span)),
        };
    }
    table.insert(
        key.clone(),
        Value::table(Table::with_flavor(flavor::EXPLICIT), header_span),
    );
    Ok(())
}

fn apply_array_header(
    table: &mut Table,
    key: &Key,
    header_span: Span,
    path: impl Fn() -> String,
) -> Result<(), Structural> {
    let entry = Value::table(
        Table::with_flavor(flavor::EXPLICIT | flavor::ARRAY_CHILD),
        header_span,
    );
    if let Some(idx) = table.find_index(&key.name) {
        let (_, val) = &mut table.entries_mut()[idx];
        return match val.kind_mut() {
            ValueKind::Array(a) if a.array_of_tables => {
                a.push(entry);
                Ok(())
            }
            ValueKind::Table(_) => {
                Err((ParseErrorKind::RedefineAsArray(path()), header_span))
            }
            _ => Err((ParseErrorKind::DuplicateKey(path()), key.span)),
        };
    }
    let mut arr = Array::new_array_of_tables();
    arr.push(entry);
    table.insert(key.clone(), Value::array(arr, header_span));
    Ok(())
}
