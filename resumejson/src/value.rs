// SPDX-License-Identifier: Apache-2.0

//! Read-only, type-erased views over parsed values.

use core::any::Any;
use std::borrow::Cow;

use crate::json_number::Number;
use crate::metadata::{Json, JsonType, Metadata};

/// A borrowed value together with the table that describes it.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
    data: &'a dyn Any,
    meta: &'static Metadata,
}

impl<'a> ValueRef<'a> {
    pub fn new<T: Json>(value: &'a T) -> Self {
        Self {
            data: value,
            meta: T::metadata(),
        }
    }

    /// Pairs `data` with `meta`. Operations on a mismatched pair find nothing.
    pub fn from_parts(data: &'a dyn Any, meta: &'static Metadata) -> Self {
        Self { data, meta }
    }

    pub fn metadata(&self) -> &'static Metadata {
        self.meta
    }

    /// Sees through variants, boxes and present optionals to the value they
    /// hold. Other values map to themselves.
    pub fn resolve(self) -> Self {
        match (self.meta.concrete)(self.data) {
            Some(inner) => inner.resolve(),
            None => self,
        }
    }

    /// The JSON type of the value. Only an unset variant reports [`JsonType::Variant`].
    pub fn json_type(&self) -> JsonType {
        self.resolve().meta.json_type()
    }

    /// Member of an object by name, or element of an array by decimal index.
    pub fn get(&self, name: &str) -> Option<ValueRef<'a>> {
        (self.meta.get)(self.data, name)
    }

    /// Live members as `(name, value)` pairs. Array elements are named by index.
    pub fn iter(&self) -> Members<'a> {
        (self.meta.iterate)(self.data)
    }

    /// Number of live members.
    pub fn size(&self) -> usize {
        (self.meta.count)(self.data)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        self.resolve().data.downcast_ref::<T>()
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.downcast_ref::<String>().map(String::as_str)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.downcast_ref::<bool>().copied()
    }

    /// False for an absent optional value.
    pub fn is_present(&self) -> bool {
        (self.meta.present)(self.data)
    }

    /// True for `null` and for absent optional values.
    pub fn is_null(&self) -> bool {
        !self.is_present() || self.json_type() == JsonType::Null
    }

    pub fn as_number(&self) -> Option<Number> {
        let value = self.resolve();
        (value.meta.number)(value.data)
    }

    /// Numeric value as `f64`. Fails for anything that is not a number.
    pub fn to_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    /// Numeric value as `i64`. Fails for non-numbers, for values out of
    /// range and for floats with a fractional part.
    pub fn to_i64(&self) -> Option<i64> {
        self.as_number()?.as_i64()
    }

    /// Follows a slash-separated path of member names and array indices.
    ///
    /// The empty path is the value itself. A leading `/` is optional, and
    /// `~1` and `~0` inside a segment stand for `/` and `~`.
    pub fn resolve_path(&self, path: &str) -> Option<ValueRef<'a>> {
        if path.is_empty() {
            return Some(*self);
        }
        let path = path.strip_prefix('/').unwrap_or(path);
        path.split('/')
            .try_fold(*self, |current, segment| current.get(&unescape_segment(segment)))
    }
}

fn unescape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

impl core::fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ValueRef")
            .field("type", &self.json_type())
            .field("metadata", &self.meta.name())
            .finish()
    }
}

/// Lazy, finite iterator over the live members of a value.
pub struct Members<'a> {
    inner: Option<Box<dyn Iterator<Item = (Cow<'a, str>, ValueRef<'a>)> + 'a>>,
}

impl<'a> Members<'a> {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = (Cow<'a, str>, ValueRef<'a>)> + 'a,
    {
        Self {
            inner: Some(Box::new(iter)),
        }
    }

    /// A sequence with no members; does not allocate.
    pub fn empty() -> Self {
        Self { inner: None }
    }
}

impl<'a> Iterator for Members<'a> {
    type Item = (Cow<'a, str>, ValueRef<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }
}
