//! Type-directed binding of a parsed [`Value`] tree onto Rust destinations.
//!
//! The [`Deserialize`] trait is this crate's reflection substitute: each
//! destination shape implements it once, and the compiler derives the rest
//! of the dispatch. A hand-written impl receives the generic value tree
//! (string-keyed tables, ordered arrays, scalars, date-times) and its result
//! is trusted unexamined, which makes it the custom-unmarshaller hook as
//! well.
//!
//! Struct-shaped impls go through [`TableHelper`], which owns the field
//! matching rules: a TOML key matches a field name case-insensitively, an
//! exact match always winning over a folded one, and every consumed key is
//! removed so no later field can re-match it.

#[cfg(test)]
#[path = "./de_tests.rs"]
mod tests;

use crate::error::{BindError, BindErrorKind, Error};
use crate::meta::{KeyPath, MetaData};
use crate::span::Span;
use crate::table::Table;
use crate::time::{Date, Datetime, LocalDatetime, Time};
use crate::value::{Key, Value, ValueKind};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// A destination shape TOML values can be bound to.
pub trait Deserialize: Sized {
    /// Produces a value of this type from a TOML value.
    ///
    /// The binder hands over the value mutably; implementations are free to
    /// take its payload. On error the value may be left partially consumed.
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error>;

    /// Binds into an existing place. The default replaces the destination;
    /// containers override it (sequences replace their contents, maps
    /// merge).
    fn deserialize_in_place(
        cx: &mut Context<'_>,
        value: &mut Value,
        place: &mut Self,
    ) -> Result<(), Error> {
        *place = Self::deserialize(cx, value)?;
        Ok(())
    }
}

/// Binding state threaded through every [`Deserialize`] call: the document
/// metadata plus the key path being bound, for error context and
/// [`Primitive`] capture.
pub struct Context<'md> {
    pub(crate) meta: &'md mut MetaData,
    pub(crate) path: KeyPath,
}

impl<'md> Context<'md> {
    pub(crate) fn new(meta: &'md mut MetaData) -> Self {
        Self {
            meta,
            path: KeyPath::default(),
        }
    }

    pub(crate) fn resuming(meta: &'md mut MetaData, path: KeyPath) -> Self {
        Self { meta, path }
    }

    /// Reborrows for a shorter-lived nested context with its own copy of
    /// the current path.
    fn reborrowed(&mut self) -> Context<'_> {
        Context {
            meta: &mut *self.meta,
            path: self.path.clone(),
        }
    }

    /// The key path currently being bound.
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub(crate) fn bind_error(&self, kind: BindErrorKind) -> Error {
        BindError::new(kind, self.path.to_string()).into()
    }

    /// Builds a type-mismatch error naming the value's TOML type.
    pub fn error_expected(&self, expected: &'static str, value: &Value) -> Error {
        self.bind_error(BindErrorKind::Wanted {
            expected,
            found: value.type_str(),
        })
    }

    /// Builds an error with a caller-supplied message, for hand-written
    /// [`Deserialize`] impls.
    pub fn error_custom(&self, msg: impl Into<Cow<'static, str>>) -> Error {
        self.bind_error(BindErrorKind::Custom(msg.into()))
    }
}

/// Unicode case folding for key matching (exact equality is checked first,
/// so this only ever breaks ties).
fn fold_eq(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// A helper for binding a TOML table to a struct-shaped destination.
///
/// Takes ownership of the table; each `required`/`optional` call removes
/// the matched key. Finish with [`finalize`](Self::finalize) (or
/// [`expect_empty`](Self::expect_empty)) to decide what leftover keys mean.
pub struct TableHelper<'md> {
    cx: Context<'md>,
    table: Table,
    span: Span,
}

impl<'md> TableHelper<'md> {
    /// Creates a helper for the value, failing if it is not a table.
    pub fn new<'a>(
        cx: &'a mut Context<'_>,
        value: &mut Value,
    ) -> Result<TableHelper<'a>, Error> {
        let span = value.span();
        let found = value.type_str();
        let ValueKind::Table(t) = value.kind_mut() else {
            return Err(cx.bind_error(BindErrorKind::Wanted {
                expected: "a table",
                found,
            }));
        };
        let table = std::mem::take(t);
        Ok(TableHelper {
            cx: cx.reborrowed(),
            table,
            span,
        })
    }

    pub(crate) fn from_parts(cx: Context<'md>, table: Table, span: Span) -> Self {
        Self { cx, table, span }
    }

    /// Returns true if the table still contains the key (exact match).
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Takes a key and its raw value, matching case-insensitively with
    /// exact-match priority.
    pub fn take(&mut self, name: &str) -> Option<(Key, Value)> {
        if let Some(i) = self.table.find_index(name) {
            return Some(self.table.remove_at(i));
        }
        let i = self
            .table
            .entries()
            .iter()
            .position(|(k, _)| fold_eq(&k.name, name))?;
        Some(self.table.remove_at(i))
    }

    /// Removes a key without decoding it (the `-` field override: the TOML
    /// key may exist and decodes into nothing).
    pub fn ignore(&mut self, name: &str) {
        let _ = self.take(name);
    }

    /// Binds a required field.
    ///
    /// # Errors
    /// - no key matches `name`
    /// - the [`Deserialize`] impl for the type fails
    pub fn required<T: Deserialize>(&mut self, name: &'static str) -> Result<T, Error> {
        let Some((key, mut val)) = self.take(name) else {
            return Err(self.cx.bind_error(BindErrorKind::MissingField(name)));
        };
        self.bind(&key, &mut val)
    }

    /// The same as [`Self::required`], except it returns a [`Spanned`](crate::Spanned).
    pub fn required_s<T: Deserialize>(
        &mut self,
        name: &'static str,
    ) -> Result<crate::Spanned<T>, Error> {
        self.required(name)
    }

    /// Binds an optional field; an absent key leaves the slot unset.
    pub fn optional<T: Deserialize>(&mut self, name: &str) -> Result<Option<T>, Error> {
        match self.take(name) {
            Some((key, mut val)) => self.bind(&key, &mut val).map(Some),
            None => Ok(None),
        }
    }

    /// The same as [`Self::optional`], except it returns a [`Spanned`](crate::Spanned).
    pub fn optional_s<T: Deserialize>(
        &mut self,
        name: &str,
    ) -> Result<Option<crate::Spanned<T>>, Error> {
        self.optional(name)
    }

    fn bind<T: Deserialize>(&mut self, key: &Key, val: &mut Value) -> Result<T, Error> {
        self.cx.path.push(&key.name);
        let out = T::deserialize(&mut self.cx, val);
        self.cx.path.pop();
        out
    }

    /// Binds an embedded record: `T`'s fields are matched against this
    /// table's remaining keys, and whatever `T` does not consume stays
    /// here. `T`'s impl must finish its helper with
    /// `finalize(Some(original))` for the leftovers to survive.
    pub fn flatten<T: Deserialize>(&mut self) -> Result<T, Error> {
        let table = std::mem::take(&mut self.table);
        let mut tmp = Value::table(table, self.span);
        let out = T::deserialize(&mut self.cx, &mut tmp);
        if let ValueKind::Table(t) = tmp.kind_mut() {
            self.table = std::mem::take(t);
        }
        out
    }

    /// Called when you are finished with this [`TableHelper`].
    ///
    /// With `None`, any keys still in the table produce an
    /// [`BindErrorKind::UnexpectedKeys`] error. Passing `Some(original)`
    /// instead puts the remaining table back into the original value,
    /// which is how an embedded record hands unconsumed keys back to its
    /// parent (see [`flatten`](Self::flatten)).
    pub fn finalize(self, original: Option<&mut Value>) -> Result<(), Error> {
        if let Some(original) = original {
            let span = original.span();
            *original = Value::table(self.table, span);
        } else if !self.table.is_empty() {
            let keys = self.table.into_keys().map(|k| k.name).collect();
            return Err(self.cx.bind_error(BindErrorKind::UnexpectedKeys(keys)));
        }
        Ok(())
    }

    /// Shorthand for `finalize(None)`.
    pub fn expect_empty(self) -> Result<(), Error> {
        self.finalize(None)
    }
}

/// A deferred subtree: binding is postponed until an explicit
/// [`MetaData::primitive_decode`] call.
///
/// While a `Primitive` is outstanding, its key path is reported by
/// [`MetaData::undecoded`]; decoding it removes the path from that set.
pub struct Primitive {
    path: KeyPath,
    value: Value,
}

impl Primitive {
    /// The key path this subtree was captured at.
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub(crate) fn into_parts(self) -> (KeyPath, Value) {
        (self.path, self.value)
    }
}

impl std::fmt::Debug for Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Primitive")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Deserialize for Primitive {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        cx.meta.mark_undecoded(cx.path.clone());
        Ok(Primitive {
            path: cx.path.clone(),
            value: value.take(),
        })
    }
}

// ---- scalar impls --------------------------------------------------------

impl Deserialize for Value {
    fn deserialize(_cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        Ok(value.take())
    }
}

impl Deserialize for String {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        let found = value.type_str();
        match value.take().into_kind() {
            ValueKind::String(s) => Ok(s),
            _ => Err(cx.bind_error(BindErrorKind::Wanted {
                expected: "a string",
                found,
            })),
        }
    }
}

impl Deserialize for bool {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        match value.as_bool() {
            Some(b) => Ok(b),
            None => Err(cx.error_expected("a boolean", value)),
        }
    }
}

fn integer_in_range(
    cx: &Context<'_>,
    value: &Value,
    min: i64,
    max: i64,
    target: &'static str,
) -> Result<i64, Error> {
    match value.as_integer() {
        Some(i) if i >= min && i <= max => Ok(i),
        Some(i) => Err(cx.bind_error(BindErrorKind::IntegerOutOfRange { value: i, target })),
        None => Err(cx.error_expected("an integer", value)),
    }
}

macro_rules! integer {
    ($($num:ty),+) => {$(
        impl Deserialize for $num {
            fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
                match integer_in_range(cx, value, <$num>::MIN as i64, <$num>::MAX as i64, stringify!($num)) {
                    Ok(i) => Ok(i as $num),
                    Err(e) => Err(e),
                }
            }
        }
    )+};
}

integer!(i8, i16, i32, i64, isize, u8, u16, u32);

impl Deserialize for u64 {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        match integer_in_range(cx, value, 0, i64::MAX, "u64") {
            Ok(i) => Ok(i as u64),
            Err(e) => Err(e),
        }
    }
}

impl Deserialize for usize {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        const MAX: i64 = if usize::BITS < 64 {
            usize::MAX as i64
        } else {
            i64::MAX
        };
        match integer_in_range(cx, value, 0, MAX, "usize") {
            Ok(i) => Ok(i as usize),
            Err(e) => Err(e),
        }
    }
}

// Integers never bind to float destinations. The promotion is lossy above
// 2^53 and silently accepting it hides mistakes; a caller who wants it can
// write it in a hand-rolled impl.
impl Deserialize for f32 {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        match value.as_float() {
            Some(f) => Ok(f as f32),
            None => Err(cx.error_expected("a float", value)),
        }
    }
}

impl Deserialize for f64 {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        match value.as_float() {
            Some(f) => Ok(f),
            None => Err(cx.error_expected("a float", value)),
        }
    }
}

impl Deserialize for Datetime {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        match value.as_datetime() {
            Some(dt) => Ok(dt),
            None => Err(cx.error_expected("an offset date-time", value)),
        }
    }
}

impl Deserialize for LocalDatetime {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        match value.as_local_datetime() {
            Some(dt) => Ok(dt),
            None => Err(cx.error_expected("a local date-time", value)),
        }
    }
}

impl Deserialize for Date {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        match value.as_date() {
            Some(d) => Ok(d),
            None => Err(cx.error_expected("a local date", value)),
        }
    }
}

impl Deserialize for Time {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        match value.as_time() {
            Some(t) => Ok(t),
            None => Err(cx.error_expected("a local time", value)),
        }
    }
}

// ---- containers ----------------------------------------------------------

impl<T: Deserialize> Deserialize for Vec<T> {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        let mut out = Vec::new();
        Self::deserialize_in_place(cx, value, &mut out)?;
        Ok(out)
    }

    /// An existing sequence is fully replaced, never merged.
    fn deserialize_in_place(
        cx: &mut Context<'_>,
        value: &mut Value,
        place: &mut Self,
    ) -> Result<(), Error> {
        let found = value.type_str();
        let ValueKind::Array(arr) = value.kind_mut() else {
            return Err(cx.bind_error(BindErrorKind::Wanted {
                expected: "an array",
                found,
            }));
        };
        let arr = std::mem::take(arr);
        place.clear();
        place.reserve(arr.len());
        for mut v in arr {
            place.push(T::deserialize(cx, &mut v)?);
        }
        Ok(())
    }
}

impl<T: Deserialize, const N: usize> Deserialize for [T; N] {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        let found = value.type_str();
        let ValueKind::Array(arr) = value.kind_mut() else {
            return Err(cx.bind_error(BindErrorKind::Wanted {
                expected: "an array",
                found,
            }));
        };
        let arr = std::mem::take(arr);
        if arr.len() != N {
            return Err(cx.bind_error(BindErrorKind::ArrayLength {
                expected: N,
                found: arr.len(),
            }));
        }
        let mut out = Vec::with_capacity(N);
        for mut v in arr {
            out.push(T::deserialize(cx, &mut v)?);
        }
        match <[T; N]>::try_from(out) {
            Ok(a) => Ok(a),
            // Length was checked above.
            Err(v) => Err(cx.bind_error(BindErrorKind::ArrayLength {
                expected: N,
                found: v.len(),
            })),
        }
    }
}

macro_rules! string_map {
    ($map:ident) => {
        impl<V: Deserialize> Deserialize for $map<String, V> {
            fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
                let mut out = Self::new();
                Self::deserialize_in_place(cx, value, &mut out)?;
                Ok(out)
            }

            /// Merge semantics: TOML keys overwrite, other existing keys
            /// are preserved.
            fn deserialize_in_place(
                cx: &mut Context<'_>,
                value: &mut Value,
                place: &mut Self,
            ) -> Result<(), Error> {
                let found = value.type_str();
                let ValueKind::Table(t) = value.kind_mut() else {
                    return Err(cx.bind_error(BindErrorKind::Wanted {
                        expected: "a table",
                        found,
                    }));
                };
                let t = std::mem::take(t);
                for (key, mut v) in t {
                    let name = key.name;
                    cx.path.push(&name);
                    let out = match place.get_mut(&name) {
                        Some(slot) => V::deserialize_in_place(cx, &mut v, slot).map(|()| None),
                        None => V::deserialize(cx, &mut v).map(Some),
                    };
                    cx.path.pop();
                    if let Some(decoded) = out? {
                        place.insert(name, decoded);
                    }
                }
                Ok(())
            }
        }
    };
}

string_map!(HashMap);
string_map!(BTreeMap);

impl<T: Deserialize> Deserialize for Option<T> {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        T::deserialize(cx, value).map(Some)
    }

    fn deserialize_in_place(
        cx: &mut Context<'_>,
        value: &mut Value,
        place: &mut Self,
    ) -> Result<(), Error> {
        match place {
            Some(inner) => T::deserialize_in_place(cx, value, inner),
            None => {
                *place = Some(T::deserialize(cx, value)?);
                Ok(())
            }
        }
    }
}

impl<T: Deserialize> Deserialize for Box<T> {
    fn deserialize(cx: &mut Context<'_>, value: &mut Value) -> Result<Self, Error> {
        T::deserialize(cx, value).map(Box::new)
    }

    fn deserialize_in_place(
        cx: &mut Context<'_>,
        value: &mut Value,
        place: &mut Self,
    ) -> Result<(), Error> {
        T::deserialize_in_place(cx, value, place)
    }
}
