use super::{Value, ValueKind};
use crate::span::Span;

fn val(kind: ValueKind) -> Value {
    Value::new(kind, Span::new(3, 9))
}

#[test]
fn accessors() {
    let v = val(ValueKind::String("hi".into()));
    assert_eq!(v.as_str(), Some("hi"));
    assert_eq!(v.as_integer(), None);
    assert_eq!(v.type_str(), "string");

    let v = val(ValueKind::Integer(7));
    assert_eq!(v.as_integer(), Some(7));
    assert_eq!(v.as_float(), None);
    assert_eq!(v.type_str(), "integer");

    let v = val(ValueKind::Float(1.5));
    assert_eq!(v.as_float(), Some(1.5));
    assert_eq!(v.type_str(), "float");

    let v = val(ValueKind::Boolean(true));
    assert_eq!(v.as_bool(), Some(true));
    assert_eq!(v.type_str(), "boolean");

    let v = val(ValueKind::Array(crate::Array::new()));
    assert!(v.as_array().is_some());
    assert!(v.as_table().is_none());
    assert_eq!(v.type_str(), "array");

    let v = val(ValueKind::Table(crate::Table::new()));
    assert!(v.as_table().is_some());
    assert_eq!(v.type_str(), "table");
}

#[test]
fn span_and_take() {
    let mut v = val(ValueKind::Integer(5));
    assert_eq!(v.span(), Span::new(3, 9));

    let taken = v.take();
    assert_eq!(taken.as_integer(), Some(5));
    assert_eq!(taken.span(), Span::new(3, 9));

    // the placeholder keeps the span
    assert_eq!(v.as_bool(), Some(false));
    assert_eq!(v.span(), Span::new(3, 9));
}

#[test]
fn datetime_kinds_report_as_datetime() {
    let root = crate::parse(
        "a = 1979-05-27T07:32:00Z\nb = 1979-05-27T07:32:00\nc = 1979-05-27\nd = 07:32:00",
    )
    .unwrap();
    for key in ["a", "b"] {
        assert_eq!(root.get(key).unwrap().type_str(), "datetime");
    }
    assert_eq!(root.get("c").unwrap().type_str(), "date");
    assert_eq!(root.get("d").unwrap().type_str(), "time");

    assert!(root.get("a").unwrap().as_datetime().is_some());
    assert!(root.get("b").unwrap().as_local_datetime().is_some());
    assert!(root.get("c").unwrap().as_date().is_some());
    assert!(root.get("d").unwrap().as_time().is_some());
}

#[test]
fn has_key_and_path_walks() {
    let root = crate::parse("[a.b]\nc = 1").unwrap();
    let v = root.value();
    assert!(v.has_key("a"));
    assert!(!v.has_key("b"));

    let t = v.as_table().unwrap();
    assert_eq!(
        t.get_path(&["a", "b", "c"]).unwrap().as_integer(),
        Some(1)
    );
    assert!(t.get_path(&["a", "x"]).is_none());
    assert!(t.get_path(&[]).is_none());
}
