use super::{Span, Spanned};

#[test]
fn span_basics() {
    let s = Span::new(2, 7);
    assert_eq!(s.len(), 5);
    assert_eq!(s.range(), 2..7);
    assert_eq!(std::ops::Range::<u32>::from(s), 2..7);
    assert_eq!(std::ops::Range::<usize>::from(s), 2..7);
    assert_eq!(Span::from(2u32..7u32), s);

    assert!(Span::new(0, 0).is_zero());
    assert!(!s.is_zero());

    let text = "ab=cd=ef";
    assert_eq!(&text[Span::new(3, 5).range()], "cd");
}

#[test]
fn spanned_basics() {
    let s = Spanned::with_span(5i64, Span::new(1, 2));
    assert_eq!(s.value, 5);
    assert_eq!(s.span, Span::new(1, 2));
    assert_eq!(s.take(), 5);

    let s = Spanned::new("x");
    assert!(s.span.is_zero());
    assert_eq!(*s.as_ref(), "x");

    // comparisons look through to the value
    let a = Spanned::with_span(1, Span::new(0, 1));
    let b = Spanned::with_span(1, Span::new(5, 6));
    assert_eq!(a, b);
    assert_eq!(a, 1);
    assert!(a < Spanned::new(2));

    let mapped: Spanned<i64> = Spanned::with_span(7i32, Span::new(3, 4)).map();
    assert_eq!(mapped.value, 7i64);
    assert_eq!(mapped.span, Span::new(3, 4));
}

#[test]
fn spanned_deserializes_with_position() {
    let input = "port = 8080";
    let mut root = crate::parse(input).unwrap();
    let port: Spanned<u16> = root.helper().required("port").unwrap();
    assert_eq!(port.value, 8080);
    assert_eq!(&input[port.span.range()], "8080");
}
