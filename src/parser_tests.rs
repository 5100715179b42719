use crate::error::{ParseError, ParseErrorKind};
use crate::meta::TomlType;
use crate::table::Table;
use crate::value::Value;

fn parse_ok(input: &str) -> Value {
    match crate::parser::parse_document(input) {
        Ok((value, _)) => value,
        Err(e) => panic!("parse failed for {input:?}: {e}"),
    }
}

fn parse_err(input: &str) -> ParseError {
    match crate::parser::parse_document(input) {
        Ok(_) => panic!("parse unexpectedly succeeded for {input:?}"),
        Err(e) => e,
    }
}

fn root_table(v: &Value) -> &Table {
    v.as_table().expect("root should be a table")
}

#[test]
fn basic_scalar_values() {
    // empty document
    let v = parse_ok("");
    assert!(root_table(&v).is_empty());

    // string
    let v = parse_ok("a = \"hello\"");
    assert_eq!(root_table(&v).get("a").unwrap().as_str(), Some("hello"));

    // integer
    let v = parse_ok("a = 42");
    assert_eq!(root_table(&v).get("a").unwrap().as_integer(), Some(42));

    // negative integer
    let v = parse_ok("a = -100");
    assert_eq!(root_table(&v).get("a").unwrap().as_integer(), Some(-100));

    // float
    let v = parse_ok("a = 3.14");
    let f = root_table(&v).get("a").unwrap().as_float().unwrap();
    assert!((f - 3.14).abs() < f64::EPSILON);

    // booleans
    let v = parse_ok("a = true");
    assert_eq!(root_table(&v).get("a").unwrap().as_bool(), Some(true));
    let v = parse_ok("a = false");
    assert_eq!(root_table(&v).get("a").unwrap().as_bool(), Some(false));

    // multiple keys
    let v = parse_ok("a = 1\nb = 2\nc = 3");
    let t = root_table(&v);
    assert_eq!(t.len(), 3);
    assert_eq!(t.get("a").unwrap().as_integer(), Some(1));
    assert_eq!(t.get("c").unwrap().as_integer(), Some(3));
}

#[test]
fn string_escapes() {
    let v = parse_ok(r#"a = "line1\nline2""#);
    assert_eq!(
        root_table(&v).get("a").unwrap().as_str(),
        Some("line1\nline2")
    );

    let v = parse_ok(r#"a = "col1\tcol2""#);
    assert_eq!(
        root_table(&v).get("a").unwrap().as_str(),
        Some("col1\tcol2")
    );

    let v = parse_ok(r#"a = "path\\to""#);
    assert_eq!(root_table(&v).get("a").unwrap().as_str(), Some("path\\to"));

    let v = parse_ok(r#"a = "say \"hi\"""#);
    assert_eq!(
        root_table(&v).get("a").unwrap().as_str(),
        Some("say \"hi\"")
    );

    // unicode short \uXXXX
    let v = parse_ok("a = \"\\u0041\"");
    assert_eq!(root_table(&v).get("a").unwrap().as_str(), Some("A"));

    // unicode long \UXXXXXXXX
    let v = parse_ok(r#"a = "\U00000041""#);
    assert_eq!(root_table(&v).get("a").unwrap().as_str(), Some("A"));
}

#[test]
fn string_types() {
    // multiline basic
    let v = parse_ok("a = \"\"\"\nhello\nworld\"\"\"");
    assert_eq!(
        root_table(&v).get("a").unwrap().as_str(),
        Some("hello\nworld")
    );

    // multiline literal
    let v = parse_ok("a = '''\nhello\nworld'''");
    assert_eq!(
        root_table(&v).get("a").unwrap().as_str(),
        Some("hello\nworld")
    );

    // literal — no escape processing
    let v = parse_ok(r#"a = 'no\escape'"#);
    assert_eq!(
        root_table(&v).get("a").unwrap().as_str(),
        Some("no\\escape")
    );

    // empty string
    let v = parse_ok(r#"a = """#);
    assert_eq!(root_table(&v).get("a").unwrap().as_str(), Some(""));

    // crlf line endings decode like lf
    let v = parse_ok("a = \"one\\ntwo\"\r\nb = 1\r\n");
    assert_eq!(root_table(&v).get("a").unwrap().as_str(), Some("one\ntwo"));
    assert_eq!(root_table(&v).get("b").unwrap().as_integer(), Some(1));
}

#[test]
fn number_formats() {
    // hex, octal, binary
    let v = parse_ok("a = 0xDEAD");
    assert_eq!(root_table(&v).get("a").unwrap().as_integer(), Some(0xDEAD));
    let v = parse_ok("a = 0o777");
    assert_eq!(root_table(&v).get("a").unwrap().as_integer(), Some(0o777));
    let v = parse_ok("a = 0b1010");
    assert_eq!(root_table(&v).get("a").unwrap().as_integer(), Some(0b1010));

    // special floats
    let v = parse_ok("a = inf");
    assert_eq!(
        root_table(&v).get("a").unwrap().as_float(),
        Some(f64::INFINITY)
    );
    let v = parse_ok("a = -inf");
    assert_eq!(
        root_table(&v).get("a").unwrap().as_float(),
        Some(f64::NEG_INFINITY)
    );
    let v = parse_ok("a = nan");
    assert!(root_table(&v).get("a").unwrap().as_float().unwrap().is_nan());
    let v = parse_ok("a = -nan");
    assert!(root_table(&v).get("a").unwrap().as_float().unwrap().is_nan());

    // exponent notation
    let v = parse_ok("a = 1e10");
    let f = root_table(&v).get("a").unwrap().as_float().unwrap();
    assert!((f - 1e10).abs() < 1.0);
    let v = parse_ok("a = 1.5E-3");
    let f = root_table(&v).get("a").unwrap().as_float().unwrap();
    assert!((f - 1.5e-3).abs() < 1e-10);
    let v = parse_ok("a = 5e+22");
    let f = root_table(&v).get("a").unwrap().as_float().unwrap();
    assert!((f - 5e22).abs() / 5e22 < 1e-12);

    // underscores
    let v = parse_ok("a = 1_000_000");
    assert_eq!(
        root_table(&v).get("a").unwrap().as_integer(),
        Some(1_000_000)
    );
    let v = parse_ok("a = 1_000.5");
    let f = root_table(&v).get("a").unwrap().as_float().unwrap();
    assert!((f - 1000.5).abs() < f64::EPSILON);

    // i64 boundaries survive exactly
    let v = parse_ok("a = -9_223_372_036_854_775_808");
    assert_eq!(root_table(&v).get("a").unwrap().as_integer(), Some(i64::MIN));
    let v = parse_ok("a = 9_223_372_036_854_775_807");
    assert_eq!(root_table(&v).get("a").unwrap().as_integer(), Some(i64::MAX));
}

#[test]
fn arrays() {
    let v = parse_ok("a = [1, 2, 3]");
    let arr = root_table(&v).get("a").unwrap().as_array().unwrap();
    assert_eq!(arr.len(), 3);
    assert_eq!(arr.get(0).unwrap().as_integer(), Some(1));
    assert_eq!(arr.get(2).unwrap().as_integer(), Some(3));

    // empty
    let v = parse_ok("a = []");
    assert!(root_table(&v).get("a").unwrap().as_array().unwrap().is_empty());

    // trailing comma and newlines are fine inside brackets
    let v = parse_ok("a = [\n  1,\n  2,\n]");
    assert_eq!(root_table(&v).get("a").unwrap().as_array().unwrap().len(), 2);

    // nested
    let v = parse_ok("a = [[1, 2], [3, 4]]");
    let arr = root_table(&v).get("a").unwrap().as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr.get(0).unwrap().as_array().unwrap().len(), 2);

    // heterogeneous
    let v = parse_ok("a = [1, \"two\", 3.0]");
    let arr = root_table(&v).get("a").unwrap().as_array().unwrap();
    assert_eq!(arr.get(1).unwrap().as_str(), Some("two"));
}

#[test]
fn inline_tables() {
    let v = parse_ok("a = {x = 1, y = 2}");
    let t = root_table(&v).get("a").unwrap().as_table().unwrap();
    assert_eq!(t.len(), 2);
    assert_eq!(t.get("x").unwrap().as_integer(), Some(1));
    assert_eq!(t.get("y").unwrap().as_integer(), Some(2));

    // empty
    let v = parse_ok("a = {}");
    assert!(root_table(&v).get("a").unwrap().as_table().unwrap().is_empty());

    // nested
    let v = parse_ok("a = {b = {c = 1}}");
    let b = root_table(&v)
        .get("a")
        .unwrap()
        .as_table()
        .unwrap()
        .get("b")
        .unwrap()
        .as_table()
        .unwrap();
    assert_eq!(b.get("c").unwrap().as_integer(), Some(1));

    // dotted keys inside an inline table
    let v = parse_ok("a = {b.c = 1, b.d = 2}");
    let b = root_table(&v)
        .get("a")
        .unwrap()
        .as_table()
        .unwrap()
        .get("b")
        .unwrap()
        .as_table()
        .unwrap();
    assert_eq!(b.get("c").unwrap().as_integer(), Some(1));
    assert_eq!(b.get("d").unwrap().as_integer(), Some(2));

    // array of inline tables
    let v = parse_ok("a = [{x = 1}, {x = 2}]");
    let arr = root_table(&v).get("a").unwrap().as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(
        arr.get(0)
            .unwrap()
            .as_table()
            .unwrap()
            .get("x")
            .unwrap()
            .as_integer(),
        Some(1)
    );
}

#[test]
fn table_headers_and_structure() {
    // simple header
    let v = parse_ok("[table]\nkey = 1");
    let t = root_table(&v).get("table").unwrap().as_table().unwrap();
    assert_eq!(t.get("key").unwrap().as_integer(), Some(1));

    // multiple headers
    let v = parse_ok("[a]\nx = 1\n[b]\ny = 2");
    let root = root_table(&v);
    assert_eq!(
        root.get("a")
            .unwrap()
            .as_table()
            .unwrap()
            .get("x")
            .unwrap()
            .as_integer(),
        Some(1)
    );
    assert_eq!(
        root.get("b")
            .unwrap()
            .as_table()
            .unwrap()
            .get("y")
            .unwrap()
            .as_integer(),
        Some(2)
    );

    // dotted header
    let v = parse_ok("[a.b.c]\nkey = 1");
    let c = root_table(&v)
        .get("a")
        .unwrap()
        .as_table()
        .unwrap()
        .get("b")
        .unwrap()
        .as_table()
        .unwrap()
        .get("c")
        .unwrap()
        .as_table()
        .unwrap();
    assert_eq!(c.get("key").unwrap().as_integer(), Some(1));

    // dotted key-value
    let v = parse_ok("a.b.c = 1");
    let b = root_table(&v)
        .get("a")
        .unwrap()
        .as_table()
        .unwrap()
        .get("b")
        .unwrap()
        .as_table()
        .unwrap();
    assert_eq!(b.get("c").unwrap().as_integer(), Some(1));

    // dotted key multiple
    let v = parse_ok("a.x = 1\na.y = 2");
    let a = root_table(&v).get("a").unwrap().as_table().unwrap();
    assert_eq!(a.get("x").unwrap().as_integer(), Some(1));
    assert_eq!(a.get("y").unwrap().as_integer(), Some(2));

    // array of tables
    let v = parse_ok("[[items]]\nname = \"a\"\n[[items]]\nname = \"b\"");
    let arr = root_table(&v).get("items").unwrap().as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(
        arr.get(0).unwrap().as_table().unwrap().get("name").unwrap().as_str(),
        Some("a")
    );
    assert_eq!(
        arr.get(1).unwrap().as_table().unwrap().get("name").unwrap().as_str(),
        Some("b")
    );

    // array of tables with subtable
    let v = parse_ok("[[fruit]]\nname = \"apple\"\n[fruit.physical]\ncolor = \"red\"");
    let fruit = root_table(&v)
        .get("fruit")
        .unwrap()
        .as_array()
        .unwrap()
        .get(0)
        .unwrap()
        .as_table()
        .unwrap();
    assert_eq!(fruit.get("name").unwrap().as_str(), Some("apple"));
    assert_eq!(
        fruit
            .get("physical")
            .unwrap()
            .as_table()
            .unwrap()
            .get("color")
            .unwrap()
            .as_str(),
        Some("red")
    );

    // nested arrays of tables
    let v = parse_ok("[[a]]\n[[a.b]]\nx = 1\n[[a]]\n[[a.b]]\nx = 2");
    let a = root_table(&v).get("a").unwrap().as_array().unwrap();
    assert_eq!(a.len(), 2);
    let second_b = a
        .get(1)
        .unwrap()
        .as_table()
        .unwrap()
        .get("b")
        .unwrap()
        .as_array()
        .unwrap();
    assert_eq!(
        second_b.get(0).unwrap().as_table().unwrap().get("x").unwrap().as_integer(),
        Some(2)
    );

    // implicit table promoted by a later header, exactly once
    let v = parse_ok("[a.b]\nx = 1\n[a]\ny = 2");
    let a = root_table(&v).get("a").unwrap().as_table().unwrap();
    assert_eq!(a.get("y").unwrap().as_integer(), Some(2));
    assert_eq!(
        a.get("b").unwrap().as_table().unwrap().get("x").unwrap().as_integer(),
        Some(1)
    );

    // a header may define sub-tables of a dotted-key table
    let v = parse_ok("fruit.apple.color = \"red\"\n[fruit.apple.texture]\nsmooth = true");
    let apple = root_table(&v)
        .get("fruit")
        .unwrap()
        .as_table()
        .unwrap()
        .get("apple")
        .unwrap()
        .as_table()
        .unwrap();
    assert_eq!(apple.get("color").unwrap().as_str(), Some("red"));
    assert_eq!(
        apple
            .get("texture")
            .unwrap()
            .as_table()
            .unwrap()
            .get("smooth")
            .unwrap()
            .as_bool(),
        Some(true)
    );
}

#[test]
fn parse_errors() {
    let e = parse_err("a = 1\na = 2");
    assert!(matches!(e.kind, ParseErrorKind::DuplicateKey(ref k) if k == "a"));

    let e = parse_err("a = \"unterminated");
    assert!(matches!(e.kind, ParseErrorKind::UnexpectedEof { .. }));

    let e = parse_err(r#"a = "\z""#);
    assert!(matches!(e.kind, ParseErrorKind::InvalidEscape('z')));

    let e = parse_err("[t]\na = 1\n[t]\nb = 2");
    assert!(matches!(e.kind, ParseErrorKind::DuplicateTable(ref k) if k == "t"));

    let e = parse_err("a = ");
    assert!(matches!(e.kind, ParseErrorKind::UnexpectedEof { .. }));

    let e = parse_err("a = 0x");
    assert!(matches!(e.kind, ParseErrorKind::InvalidInteger(_)));

    // scalar redefined as table
    let e = parse_err("a = 1\n[a]\nb = 2");
    assert!(matches!(e.kind, ParseErrorKind::DuplicateKey(_)));

    // inline table redefined as table
    let e = parse_err("a = {x = 1}\n[a]\ny = 2");
    assert!(matches!(e.kind, ParseErrorKind::DuplicateKey(_)));

    // inline tables are closed after `}`
    let e = parse_err("a = {x = 1}\na.y = 2");
    assert!(matches!(e.kind, ParseErrorKind::ExtendInlineTable(_)));

    // dotted key through a scalar
    let e = parse_err("a = 1\na.b = 2");
    assert!(matches!(e.kind, ParseErrorKind::DottedKeyInvalidType(_)));

    // a table is not an array of tables
    let e = parse_err("[a]\nx = 1\n[[a]]");
    assert!(matches!(e.kind, ParseErrorKind::RedefineAsArray(ref k) if k == "a"));

    // a static array cannot be appended to
    let e = parse_err("a = [1]\n[[a]]");
    assert!(matches!(e.kind, ParseErrorKind::DuplicateKey(_)));

    // an array of tables cannot be reopened as a plain table
    let e = parse_err("[[a]]\n[a]");
    assert!(matches!(e.kind, ParseErrorKind::DuplicateKey(_)));

    // promoting an implicit table twice
    let e = parse_err("[a.b]\n[a]\n[a]");
    assert!(matches!(e.kind, ParseErrorKind::DuplicateTable(_)));

    // header on a dotted-key table
    let e = parse_err("a.b = 1\n[a]");
    assert!(matches!(e.kind, ParseErrorKind::DuplicateKey(_)));

    // newline inside an inline table
    let e = parse_err("a = {x = 1\n}");
    assert!(matches!(e.kind, ParseErrorKind::NewlineInInlineTable));

    // trailing comma in an inline table
    let e = parse_err("a = {x = 1,}");
    assert!(matches!(e.kind, ParseErrorKind::Expected { .. }));

    // missing value at newline
    let e = parse_err("a = \nb = 1");
    assert!(matches!(e.kind, ParseErrorKind::Expected { expected: "a value", .. }));

    // garbage after a value
    let e = parse_err("a = 1 2");
    assert!(matches!(e.kind, ParseErrorKind::Expected { expected: "a newline", .. }));
}

#[test]
fn error_position_and_last_key() {
    let e = parse_err("a = \"a\"\nb = \"b\"\nc = 001\n");
    assert_eq!(e.line, 3);
    assert_eq!(e.last_key, "c");
    assert!(matches!(e.kind, ParseErrorKind::LeadingZero));
    let msg = e.to_string();
    assert!(msg.contains("line 3"), "message was {msg:?}");
    assert!(msg.contains("last key parsed 'c'"), "message was {msg:?}");

    // no last key before the first separator
    let e = parse_err("x");
    assert!(e.last_key.is_empty());
    assert!(e.to_string().contains("key separator '='"));

    // dotted context inside a section
    let e = parse_err("[tbl]\nnum = 1\nnum = 2");
    assert_eq!(e.last_key, "tbl.num");
}

#[test]
fn quoted_keys_and_spans() {
    // basic quoted key
    let v = parse_ok(r#""quoted key" = 1"#);
    assert_eq!(
        root_table(&v).get("quoted key").unwrap().as_integer(),
        Some(1)
    );

    // quoted key with escape
    let v = parse_ok(r#""key\nwith\nnewlines" = 1"#);
    assert_eq!(
        root_table(&v)
            .get("key\nwith\nnewlines")
            .unwrap()
            .as_integer(),
        Some(1)
    );

    // literal quoted key
    let v = parse_ok("'literal key' = 1");
    assert_eq!(
        root_table(&v).get("literal key").unwrap().as_integer(),
        Some(1)
    );

    // dotted quoted segments keep their dots
    let v = parse_ok("[a.\"b.c\"]\nx = 1");
    let bc = root_table(&v)
        .get("a")
        .unwrap()
        .as_table()
        .unwrap()
        .get("b.c")
        .unwrap()
        .as_table()
        .unwrap();
    assert_eq!(bc.get("x").unwrap().as_integer(), Some(1));

    // span for integer value
    let input = "key = 42";
    let v = parse_ok(input);
    let span = root_table(&v).get("key").unwrap().span();
    assert_eq!(&input[span.range()], "42");

    // span for string value
    let input = "key = \"hello\"";
    let v = parse_ok(input);
    let span = root_table(&v).get("key").unwrap().span();
    assert_eq!(&input[span.range()], "hello");
}

#[test]
fn comments_and_whitespace() {
    let v = parse_ok("# comment\na = 1 # inline comment\n# another");
    assert_eq!(root_table(&v).get("a").unwrap().as_integer(), Some(1));

    let v = parse_ok("\n\n\na = 1\n\n\n");
    assert_eq!(root_table(&v).get("a").unwrap().as_integer(), Some(1));

    let v = parse_ok("[tbl] # trailing\nx = 1");
    assert!(root_table(&v).get("tbl").unwrap().as_table().is_some());

    // comments inside arrays
    let v = parse_ok("a = [ # start\n1, # one\n2,\n]");
    assert_eq!(root_table(&v).get("a").unwrap().as_array().unwrap().len(), 2);
}

#[test]
fn metadata_recording() {
    let input = "\
title = \"x\"
[server]
port = 80
ips = [\"a\", \"b\"]
[[albums]]
name = \"one\"
[[albums]]
name = \"two\"
point = {x = 1, y = 2}
";
    let (_, meta) = crate::parser::parse_document(input).unwrap();

    let keys: Vec<String> = meta.keys().map(|k| k.to_string()).collect();
    assert_eq!(
        keys,
        [
            "title",
            "server",
            "server.port",
            "server.ips",
            "albums",
            "albums.name",
            "albums.point",
            "albums.point.x",
            "albums.point.y",
        ]
    );

    assert_eq!(meta.type_of(&["title"]), Some(TomlType::String));
    assert_eq!(meta.type_of(&["server"]), Some(TomlType::Hash));
    assert_eq!(meta.type_of(&["server", "port"]), Some(TomlType::Integer));
    assert_eq!(meta.type_of(&["server", "ips"]), Some(TomlType::Array));
    assert_eq!(meta.type_of(&["albums"]), Some(TomlType::ArrayHash));
    assert_eq!(meta.type_of(&["albums", "name"]), Some(TomlType::String));
    assert_eq!(meta.type_of(&["albums", "point"]), Some(TomlType::Hash));
    assert_eq!(meta.type_of(&["nope"]), None);

    assert!(meta.is_defined(&["server", "port"]));
    assert!(meta.is_defined(&["server"]));
    assert!(!meta.is_defined(&["server", "nope"]));

    // every recorded key reports as defined with a type
    for key in meta.keys() {
        let segs: Vec<&str> = key.segments().iter().map(String::as_str).collect();
        assert!(meta.is_defined(&segs), "{key} not defined");
        assert!(meta.type_of(&segs).is_some(), "{key} has no type");
    }
}

#[test]
fn recursion_limit() {
    let mut deep = String::from("a = ");
    for _ in 0..400 {
        deep.push('[');
    }
    let e = parse_err(&deep);
    assert!(matches!(e.kind, ParseErrorKind::RecursionLimit));
}
