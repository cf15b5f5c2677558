// SPDX-License-Identifier: Apache-2.0

//! Indirect values: `Box<T>` and the nullable `Option<T>`.
//!
//! Both wrap the inner type's own frame instead of calling it as a child, so
//! they add no stack depth.

use core::any::Any;

use crate::continuation::{Scratch, Step};
use crate::frame::{deliver_into, GenFrame, ParseFrame};
use crate::input_cursor::InputCursor;
use crate::json_number::Number;
use crate::literal::{LiteralGen, LiteralMatcher};
use crate::metadata::{Json, JsonType};
use crate::parse_error::{GenerateError, ParseError, UnexpectedState};
use crate::value::{Members, ValueRef};

/// Parses `T` and delivers it boxed.
pub struct BoxFrame<T> {
    inner: Box<dyn ParseFrame>,
    _marker: core::marker::PhantomData<fn() -> T>,
}

impl<T: Json> ParseFrame for BoxFrame<T> {
    fn resume(
        &mut self,
        input: &mut InputCursor<'_>,
        scratch: &mut Scratch,
    ) -> Result<Step<dyn ParseFrame>, ParseError> {
        self.inner.resume(input, scratch)
    }

    fn accept(&mut self, child: Box<dyn ParseFrame>) -> Result<(), ParseError> {
        self.inner.accept(child)
    }

    fn deliver(self: Box<Self>, slot: &mut dyn Any) -> Result<(), ParseError> {
        let mut value = T::default();
        self.inner.deliver(&mut value)?;
        deliver_into(slot, Box::new(value))
    }
}

impl<T: Json> Json for Box<T> {
    const JSON_TYPE: JsonType = T::JSON_TYPE;

    fn parse_frame() -> Box<dyn ParseFrame> {
        Box::new(BoxFrame::<T> {
            inner: T::parse_frame(),
            _marker: core::marker::PhantomData,
        })
    }

    fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
        (**self).generate_frame()
    }

    fn finalize(&mut self) {
        (**self).finalize();
    }

    fn member(&self, name: &str) -> Option<ValueRef<'_>> {
        (**self).member(name)
    }

    fn members(&self) -> Members<'_> {
        (**self).members()
    }

    fn member_count(&self) -> usize {
        (**self).member_count()
    }

    fn to_number(&self) -> Option<Number> {
        (**self).to_number()
    }

    fn concrete(&self) -> Option<ValueRef<'_>> {
        Some(ValueRef::new(&**self))
    }
}

enum OptionState {
    Start,
    Null(LiteralMatcher),
    Value(Box<dyn ParseFrame>),
}

/// Parses `null` as `None` and anything else as `Some(T)`.
pub struct OptionFrame<T> {
    state: OptionState,
    _marker: core::marker::PhantomData<fn() -> T>,
}

impl<T: Json> ParseFrame for OptionFrame<T> {
    fn resume(
        &mut self,
        input: &mut InputCursor<'_>,
        scratch: &mut Scratch,
    ) -> Result<Step<dyn ParseFrame>, ParseError> {
        if let OptionState::Start = self.state {
            match input.significant()? {
                None => return Ok(Step::Pause),
                Some(b'n') => self.state = OptionState::Null(LiteralMatcher::new(b"null")),
                Some(_) => self.state = OptionState::Value(T::parse_frame()),
            }
        }
        match &mut self.state {
            OptionState::Null(matcher) => {
                if matcher.advance(input)? {
                    Ok(Step::Complete)
                } else {
                    Ok(Step::Pause)
                }
            }
            OptionState::Value(inner) => inner.resume(input, scratch),
            OptionState::Start => Ok(Step::Pause),
        }
    }

    fn accept(&mut self, child: Box<dyn ParseFrame>) -> Result<(), ParseError> {
        match &mut self.state {
            OptionState::Value(inner) => inner.accept(child),
            _ => {
                drop(child);
                Err(UnexpectedState::StrayChild.into())
            }
        }
    }

    fn deliver(self: Box<Self>, slot: &mut dyn Any) -> Result<(), ParseError> {
        match self.state {
            OptionState::Value(inner) => {
                let mut value = T::default();
                inner.deliver(&mut value)?;
                deliver_into(slot, Some(value))
            }
            _ => deliver_into(slot, None::<T>),
        }
    }
}

impl<T: Json> Json for Option<T> {
    const JSON_TYPE: JsonType = T::JSON_TYPE;
    const POINTER_PRESENCE: bool = true;

    fn parse_frame() -> Box<dyn ParseFrame> {
        Box::new(OptionFrame::<T> {
            state: OptionState::Start,
            _marker: core::marker::PhantomData,
        })
    }

    fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
        match self {
            Some(value) => value.generate_frame(),
            None => Ok(Box::new(LiteralGen::new(b"null"))),
        }
    }

    fn finalize(&mut self) {
        if let Some(value) = self {
            value.finalize();
        }
        *self = None;
    }

    fn member(&self, name: &str) -> Option<ValueRef<'_>> {
        self.as_ref()?.member(name)
    }

    fn members(&self) -> Members<'_> {
        match self {
            Some(value) => value.members(),
            None => Members::empty(),
        }
    }

    fn member_count(&self) -> usize {
        self.as_ref().map_or(0, T::member_count)
    }

    fn is_present(&self) -> bool {
        self.is_some()
    }

    fn to_number(&self) -> Option<Number> {
        self.as_ref()?.to_number()
    }

    fn concrete(&self) -> Option<ValueRef<'_>> {
        self.as_ref().map(ValueRef::new)
    }
}
