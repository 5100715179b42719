//! Byte-offset span types for source location tracking.

#[cfg(test)]
#[path = "./span_tests.rs"]
mod tests;

/// A half-open byte range `[start, end)` into the source document.
///
/// Use [`range`](Self::range) to slice the original input with it.
#[derive(Copy, Clone, Eq, PartialEq, Default, Debug)]
pub struct Span {
    /// First byte of the spanned text.
    pub start: u32,
    /// One past the last byte of the spanned text.
    pub end: u32,
}

impl Span {
    /// A span covering `start..end`.
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Length of the spanned text in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// The span as a `usize` range, suitable for indexing the source text.
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Returns `true` for the all-zero span, the placeholder on values
    /// that have no source location.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

impl From<std::ops::Range<u32>> for Span {
    fn from(r: std::ops::Range<u32>) -> Self {
        Span::new(r.start, r.end)
    }
}

impl From<Span> for std::ops::Range<u32> {
    fn from(s: Span) -> Self {
        s.start..s.end
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(s: Span) -> Self {
        s.range()
    }
}

/// A decoded value paired with the [`Span`] it was decoded from.
///
/// Ask a [`TableHelper`](crate::TableHelper) for `Spanned<T>` instead of
/// `T` when the caller needs to point back at the source, e.g. for its own
/// diagnostics.
///
/// # Examples
///
/// ```
/// use toml_bind::Spanned;
///
/// let mut root = toml_bind::parse("name = \"hello\"")?;
/// let name: Spanned<String> = root.helper().required("name")?;
/// assert_eq!(name.value, "hello");
/// assert!(name.span.start < name.span.end);
/// # Ok::<(), toml_bind::Error>(())
/// ```
pub struct Spanned<T> {
    /// The decoded value.
    pub value: T,
    /// The byte-offset span in the source document.
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Wraps a value with the zero placeholder span.
    #[inline]
    pub const fn new(value: T) -> Self {
        Self {
            value,
            span: Span { start: 0, end: 0 },
        }
    }

    /// Wraps a value with its span.
    #[inline]
    pub const fn with_span(value: T, span: Span) -> Self {
        Self { value, span }
    }

    /// Unwraps the value, discarding the span.
    #[inline]
    pub fn take(self) -> T {
        self.value
    }

    /// Converts the inner value through [`From`]; the span stays.
    #[inline]
    pub fn map<V>(self) -> Spanned<V>
    where
        V: From<T>,
    {
        Spanned {
            value: self.value.into(),
            span: self.span,
        }
    }
}

impl<T> Default for Spanned<T>
where
    T: Default,
{
    fn default() -> Self {
        Self {
            value: Default::default(),
            span: Span::default(),
        }
    }
}

impl<T> AsRef<T> for Spanned<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T> std::fmt::Debug for Spanned<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

impl<T> Clone for Spanned<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            span: self.span,
        }
    }
}

impl<T> PartialOrd for Spanned<T>
where
    T: PartialOrd,
{
    fn partial_cmp(&self, o: &Spanned<T>) -> Option<std::cmp::Ordering> {
        self.value.partial_cmp(&o.value)
    }
}

impl<T> Ord for Spanned<T>
where
    T: Ord,
{
    fn cmp(&self, o: &Spanned<T>) -> std::cmp::Ordering {
        self.value.cmp(&o.value)
    }
}

impl<T> PartialEq for Spanned<T>
where
    T: PartialEq,
{
    fn eq(&self, o: &Spanned<T>) -> bool {
        self.value == o.value
    }
}

impl<T> Eq for Spanned<T> where T: Eq {}

impl<T> PartialEq<T> for Spanned<T>
where
    T: PartialEq,
{
    fn eq(&self, o: &T) -> bool {
        &self.value == o
    }
}

impl<T> crate::de::Deserialize for Spanned<T>
where
    T: crate::de::Deserialize,
{
    #[inline]
    fn deserialize(
        cx: &mut crate::de::Context<'_>,
        value: &mut crate::value::Value,
    ) -> Result<Self, crate::Error> {
        let span = value.span();
        let inner = T::deserialize(cx, value)?;
        Ok(Self { span, value: inner })
    }
}

/// Serializes as the inner value; the span is not part of the data.
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
impl<T> serde::Serialize for Spanned<T>
where
    T: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}
