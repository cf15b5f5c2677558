// SPDX-License-Identifier: Apache-2.0

//! Incremental JSON parsing and generation into typed values.
//!
//! Parsing and generation run on an explicit continuation stack, so either
//! can stop after any byte of input or output and resume later on another
//! buffer, and document nesting never consumes host stack.
//!
//! ```
//! use resumejson::{from_str, to_string, ValueRef, Variant};
//!
//! let doc: Variant = from_str(r#"{"a":{"list":[1,2,3]}}"#).unwrap();
//! let root = ValueRef::new(&doc);
//! assert_eq!(root.resolve_path("/a/list/2").and_then(|v| v.to_i64()), Some(3));
//! assert_eq!(to_string(&doc).unwrap(), r#"{"a":{"list":[1,2,3]}}"#);
//! ```

mod continuation;
pub use continuation::{
    ContinuationStack, DefaultConfig, DepthLimit, Driver, RunState, Scratch, StackConfig,
    StackError, Step,
};

mod parse_error;
pub use parse_error::{ErrorKind, GenerateError, ParseError, UnexpectedState};

mod input_cursor;

mod escape_processor;

mod frame;
pub use frame::{GenFrame, GenerateFrame, Output, ParseFrame};

mod metadata;
pub use metadata::{introduce, Json, JsonType, Metadata};

mod value;
pub use value::{Members, ValueRef};

mod number_parser;

mod json_number;
pub use json_number::Number;

mod int_parser;

mod json_string;

mod literal;
pub use literal::Null;

mod array;

mod optional;

mod presence;
pub use presence::{PresenceBits, WideBits};

mod object;
pub use object::{Extras, Field, Map, Presence, Record};

mod variant;
pub use variant::Variant;

mod macros;

mod push_parser;
pub use push_parser::{ParserState, PushParser};

mod generator;
pub use generator::Generator;

/// Output is produced in pieces of this size by [`to_vec`].
const CHUNK: usize = 256;

/// Parses a complete document held in one slice.
pub fn from_slice<T: Json>(data: &[u8]) -> Result<T, ParseError> {
    let mut parser = PushParser::<T>::new();
    parser.feed(data)?;
    parser.finish()
}

/// Parses a complete document held in one string.
pub fn from_str<T: Json>(text: &str) -> Result<T, ParseError> {
    from_slice(text.as_bytes())
}

/// Generates `value` as compact JSON bytes.
pub fn to_vec<T: Json>(value: &T) -> Result<Vec<u8>, GenerateError> {
    let mut generator = Generator::new(value);
    let mut text = Vec::new();
    let mut buf = [0u8; CHUNK];
    while !generator.is_finished() {
        let n = generator.generate(&mut buf)?;
        text.try_reserve(n).map_err(|_| GenerateError::AllocationFailed)?;
        text.extend_from_slice(buf.get(..n).unwrap_or_default());
    }
    Ok(text)
}

/// Generates `value` as a compact JSON string.
pub fn to_string<T: Json>(value: &T) -> Result<String, GenerateError> {
    String::from_utf8(to_vec(value)?)
        .map_err(|_| GenerateError::Unexpected(UnexpectedState::InvalidOutput))
}

/// Items used by [`record!`] expansions.
#[doc(hidden)]
pub mod __private {
    pub use crate::frame::{GenFrame, ParseFrame};
    pub use crate::metadata::{Json, JsonType};
    pub use crate::object::{Field, Presence, Record};
    pub use crate::parse_error::GenerateError;
    pub use crate::presence::{PresenceBits, WideBits};
    pub use crate::value::{Members, ValueRef};

    pub mod object {
        pub use crate::object::{
            finalize, generate_frame, member, member_count, members, parse_frame,
        };
    }
}
