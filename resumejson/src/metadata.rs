// SPDX-License-Identifier: Apache-2.0

//! Per-type dispatch tables and the [`Json`] trait that produces them.

use core::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use log::debug;

use crate::frame::{GenFrame, ParseFrame};
use crate::json_number::Number;
use crate::parse_error::{GenerateError, UnexpectedState};
use crate::value::{Members, ValueRef};

/// The JSON shape a type reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    String,
    Object,
    Array,
    Number,
    Bool,
    Null,
    /// Decided per value at parse time.
    Variant,
}

/// A type that can be parsed from and generated to JSON incrementally.
///
/// Implementations exist for the scalar types, [`Vec`], [`Box`], [`Option`],
/// [`Extras`](crate::Extras), [`Variant`](crate::Variant) and every type
/// declared with [`record!`](crate::record).
pub trait Json: Any + Default {
    const JSON_TYPE: JsonType;

    /// Members of this type use "non-null" presence instead of a presence bit.
    #[doc(hidden)]
    const POINTER_PRESENCE: bool = false;

    #[doc(hidden)]
    fn parse_frame() -> Box<dyn ParseFrame>;

    #[doc(hidden)]
    fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError>;

    /// Releases owned memory and returns the value to its initial state.
    /// Calling it again is a no-op.
    fn finalize(&mut self) {
        *self = Self::default();
    }

    /// Member lookup by name. Only containers have members.
    fn member(&self, _name: &str) -> Option<ValueRef<'_>> {
        None
    }

    /// Live members in order.
    fn members(&self) -> Members<'_> {
        Members::empty()
    }

    /// Number of live members.
    fn member_count(&self) -> usize {
        0
    }

    /// False for an absent optional value.
    fn is_present(&self) -> bool {
        true
    }

    /// Numeric view, for number-like types.
    fn to_number(&self) -> Option<Number> {
        None
    }

    /// The concrete value behind a dynamically typed one.
    fn concrete(&self) -> Option<ValueRef<'_>> {
        None
    }

    /// The shared dispatch table for this type.
    fn metadata() -> &'static Metadata {
        introduce::<Self>()
    }
}

/// Type-erased dispatch table for one [`Json`] type.
///
/// Every container reaches its members through these operations only.
pub struct Metadata {
    name: &'static str,
    json_type: JsonType,
    size: usize,
    pub(crate) parse: fn() -> Box<dyn ParseFrame>,
    pub(crate) generate: for<'a> fn(&'a dyn Any) -> Result<GenFrame<'a>, GenerateError>,
    pub(crate) finalize: fn(&mut dyn Any),
    pub(crate) get: for<'a, 'n> fn(&'a dyn Any, &'n str) -> Option<ValueRef<'a>>,
    pub(crate) iterate: for<'a> fn(&'a dyn Any) -> Members<'a>,
    pub(crate) count: fn(&dyn Any) -> usize,
    pub(crate) present: fn(&dyn Any) -> bool,
    pub(crate) number: fn(&dyn Any) -> Option<Number>,
    pub(crate) concrete: for<'a> fn(&'a dyn Any) -> Option<ValueRef<'a>>,
}

impl Metadata {
    fn of<T: Json>() -> Self {
        Self {
            name: core::any::type_name::<T>(),
            json_type: T::JSON_TYPE,
            size: core::mem::size_of::<T>(),
            parse: T::parse_frame,
            generate: generate_shim::<T>,
            finalize: finalize_shim::<T>,
            get: get_shim::<T>,
            iterate: iterate_shim::<T>,
            count: count_shim::<T>,
            present: present_shim::<T>,
            number: number_shim::<T>,
            concrete: concrete_shim::<T>,
        }
    }

    /// Rust type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn json_type(&self) -> JsonType {
        self.json_type
    }

    /// In-memory size of the described type in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs the type's finalizer on `value`. Values of another type are left alone.
    pub fn finalize(&self, value: &mut dyn Any) {
        (self.finalize)(value)
    }
}

impl core::fmt::Debug for Metadata {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Metadata")
            .field("name", &self.name)
            .field("json_type", &self.json_type)
            .field("size", &self.size)
            .finish()
    }
}

fn generate_shim<'a, T: Json>(value: &'a dyn Any) -> Result<GenFrame<'a>, GenerateError> {
    value
        .downcast_ref::<T>()
        .ok_or(GenerateError::Unexpected(UnexpectedState::SlotTypeMismatch))?
        .generate_frame()
}

fn finalize_shim<T: Json>(value: &mut dyn Any) {
    if let Some(value) = value.downcast_mut::<T>() {
        value.finalize();
    }
}

fn get_shim<'a, T: Json>(value: &'a dyn Any, name: &str) -> Option<ValueRef<'a>> {
    value.downcast_ref::<T>()?.member(name)
}

fn iterate_shim<'a, T: Json>(value: &'a dyn Any) -> Members<'a> {
    match value.downcast_ref::<T>() {
        Some(value) => value.members(),
        None => Members::empty(),
    }
}

fn count_shim<T: Json>(value: &dyn Any) -> usize {
    value.downcast_ref::<T>().map_or(0, T::member_count)
}

fn present_shim<T: Json>(value: &dyn Any) -> bool {
    value.downcast_ref::<T>().is_some_and(T::is_present)
}

fn number_shim<T: Json>(value: &dyn Any) -> Option<Number> {
    value.downcast_ref::<T>()?.to_number()
}

fn concrete_shim<'a, T: Json>(value: &'a dyn Any) -> Option<ValueRef<'a>> {
    value.downcast_ref::<T>()?.concrete()
}

type Registry = RwLock<HashMap<TypeId, &'static Metadata>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Returns the dispatch table for `T`, building it on first use.
///
/// Each table is built at most once per process and lives for the rest of
/// it. Building a table never builds the tables of member types, which are
/// reached through deferred `fn() -> &'static Metadata` pointers, so
/// recursive and mutually recursive types introduce without recursion.
pub fn introduce<T: Json>() -> &'static Metadata {
    let id = TypeId::of::<T>();
    let registry = REGISTRY.get_or_init(Registry::default);
    if let Some(metadata) = registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
    {
        return *metadata;
    }
    let mut tables = registry.write().unwrap_or_else(PoisonError::into_inner);
    *tables.entry(id).or_insert_with(|| {
        debug!("introducing metadata for {}", core::any::type_name::<T>());
        Box::leak(Box::new(Metadata::of::<T>()))
    })
}
