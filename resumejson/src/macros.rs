// SPDX-License-Identifier: Apache-2.0

/// Declares a struct that parses from and generates to a JSON object.
///
/// Each member may be renamed with `as "name"`. Members track presence with
/// a bit each, except `Option` members, which are present when `Some`. A
/// trailing `extras: Type` collects unknown members into a public `extras`
/// field; without it an unknown member fails the parse with
/// [`ParseError::UnknownMember`](crate::ParseError::UnknownMember).
///
/// ```
/// resumejson::record! {
///     #[derive(Debug)]
///     pub struct Point {
///         pub x: i32,
///         pub y: i32,
///         pub label as "name": Option<String>,
///     }
/// }
///
/// let point: Point = resumejson::from_str(r#"{"x":1,"y":-2,"name":"a"}"#).unwrap();
/// assert_eq!((point.x, point.y), (1, -2));
/// assert_eq!(point.label.as_deref(), Some("a"));
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident $(as $rename:literal)? : $ty:ty
            ),* $(,)?
        }
        $(extras: $extra:ty $(,)?)?
    ) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
            $(
                /// Members not in the fixed table, in document order.
                pub extras: $crate::Extras<$extra>,
            )?
            #[doc(hidden)]
            pub __presence: $crate::WideBits<
                { (<[&str]>::len(&[$(stringify!($field)),*]) + 63) / 64 },
                u64,
            >,
        }

        const _: () = {
            use $crate::__private::{
                object, Field, GenFrame, GenerateError, Json, JsonType, Members,
                ParseFrame, Presence, PresenceBits, Record, ValueRef,
            };

            #[allow(non_camel_case_types, dead_code)]
            enum __Bit {
                $($field,)*
            }

            impl Record for $name {
                type Extra = $crate::__record_extra!($($extra)?);

                const FIELDS: &'static [Field<Self>] = &[
                    $(
                        Field {
                            name: $crate::__json_name!($field $(, $rename)?),
                            meta: <$ty as Json>::metadata,
                            presence: Presence::of::<$ty>(__Bit::$field as usize),
                            slot: |value| &mut value.$field,
                            read: |value| &value.$field,
                        },
                    )*
                ];

                fn presence_bit(&self, index: usize) -> bool {
                    self.__presence.bit(index)
                }

                fn set_presence_bit(&mut self, index: usize, present: bool) {
                    self.__presence.set_bit(index, present)
                }

                $(
                    fn extras(&self) -> Option<&$crate::Extras<$extra>> {
                        Some(&self.extras)
                    }

                    fn extras_mut(&mut self) -> Option<&mut $crate::Extras<$extra>> {
                        Some(&mut self.extras)
                    }
                )?
            }

            impl Json for $name {
                const JSON_TYPE: JsonType = JsonType::Object;

                fn parse_frame() -> Box<dyn ParseFrame> {
                    object::parse_frame::<Self>()
                }

                fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
                    object::generate_frame(self)
                }

                fn finalize(&mut self) {
                    object::finalize(self)
                }

                fn member(&self, name: &str) -> Option<ValueRef<'_>> {
                    object::member(self, name)
                }

                fn members(&self) -> Members<'_> {
                    object::members(self)
                }

                fn member_count(&self) -> usize {
                    object::member_count(self)
                }
            }
        };
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __json_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $rename:literal) => {
        $rename
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_extra {
    () => {
        $crate::Null
    };
    ($extra:ty) => {
        $extra
    };
}

#[cfg(test)]
mod tests {
    use crate::{from_str, to_string, Json, ParseError, Record, ValueRef, Variant};
    use test_log::test;

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Person {
            pub name: String,
            pub age as "years": u32,
            pub email: Option<String>,
            pub tags: Vec<String>,
        }
    }

    crate::record! {
        #[derive(Debug)]
        struct Tree {
            value: i64,
            children: Vec<Tree>,
        }
    }

    crate::record! {
        #[derive(Debug)]
        struct Open {
            id: u64,
        }
        extras: Variant
    }

    crate::record! {
        #[derive(Debug)]
        struct Wide {
            m0: u8,
            m1: u8,
            m2: u8,
            m3: u8,
            m4: u8,
            m5: u8,
            m6: u8,
            m7: u8,
            m8: u8,
            m9: u8,
            m10: u8,
            m11: u8,
            m12: u8,
            m13: u8,
            m14: u8,
            m15: u8,
            m16: u8,
            m17: u8,
            m18: u8,
            m19: u8,
            m20: u8,
            m21: u8,
            m22: u8,
            m23: u8,
            m24: u8,
            m25: u8,
            m26: u8,
            m27: u8,
            m28: u8,
            m29: u8,
            m30: u8,
            m31: u8,
            m32: u8,
            m33: u8,
            m34: u8,
            m35: u8,
            m36: u8,
            m37: u8,
            m38: u8,
            m39: u8,
            m40: u8,
            m41: u8,
            m42: u8,
            m43: u8,
            m44: u8,
            m45: u8,
            m46: u8,
            m47: u8,
            m48: u8,
            m49: u8,
            m50: u8,
            m51: u8,
            m52: u8,
            m53: u8,
            m54: u8,
            m55: u8,
            m56: u8,
            m57: u8,
            m58: u8,
            m59: u8,
            m60: u8,
            m61: u8,
            m62: u8,
            m63: u8,
            m64: u8,
            m65: u8,
            m66: u8,
            m67: u8,
            m68: u8,
            m69: u8,
        }
    }

    #[test]
    fn test_parse_record() {
        let person: Person =
            from_str(r#"{"name":"Ada","years":36,"tags":["x","y"]}"#).unwrap();
        assert_eq!(person.name, "Ada");
        assert_eq!(person.age, 36);
        assert_eq!(person.email, None);
        assert_eq!(person.tags, vec!["x", "y"]);
        assert!(person.has("name"));
        assert!(person.has("years"));
        assert!(!person.has("email"));
        assert!(!person.has("age"));
    }

    #[test]
    fn test_missing_members_stay_absent() {
        let person: Person = from_str(r#"{"name":"Ada"}"#).unwrap();
        assert!(!person.has("years"));
        assert!(!person.has("tags"));
        assert_eq!(to_string(&person).unwrap(), r#"{"name":"Ada"}"#);
    }

    #[test]
    fn test_explicit_null_optional_is_absent() {
        let person: Person = from_str(r#"{"name":"a","email":null}"#).unwrap();
        assert_eq!(person.email, None);
        assert!(!person.has("email"));
        assert!(ValueRef::new(&person).get("email").is_none());
        assert_eq!(to_string(&person).unwrap(), r#"{"name":"a"}"#);
    }

    #[test]
    fn test_unknown_member_rejected() {
        assert_eq!(
            from_str::<Person>(r#"{"name":"Ada","age":3}"#),
            Err(ParseError::UnknownMember("age".into()))
        );
    }

    #[test]
    fn test_unknown_members_go_to_extras() {
        let open: Open = from_str(r#"{"x":[1],"id":7,"y":"z"}"#).unwrap();
        assert_eq!(open.id, 7);
        assert_eq!(open.extras.len(), 2);
        assert_eq!(open.extras.get("y").and_then(Variant::as_str), Some("z"));
        assert_eq!(to_string(&open).unwrap(), r#"{"id":7,"x":[1],"y":"z"}"#);
    }

    #[test]
    fn test_recursive_record() {
        let tree: Tree =
            from_str(r#"{"value":1,"children":[{"value":2,"children":[]},{"value":3}]}"#)
                .unwrap();
        assert_eq!(tree.value, 1);
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[1].value, 3);
        assert!(!tree.children[1].has("children"));
        let view = ValueRef::new(&tree);
        assert_eq!(
            view.resolve_path("/children/0/value").and_then(|v| v.to_i64()),
            Some(2)
        );
        assert!(view.resolve_path("/children/1/children").is_none());
    }

    #[test]
    fn test_generate_requires_presence() {
        let mut person = Person {
            name: "Bob".into(),
            age: 5,
            ..Person::default()
        };
        assert_eq!(to_string(&person).unwrap(), "{}");
        person.mark_all_present();
        assert_eq!(
            to_string(&person).unwrap(),
            r#"{"name":"Bob","years":5,"tags":[]}"#
        );
        person.email = Some("b@example.com".into());
        assert!(person.set_present("tags", false));
        assert!(!person.set_present("nope", true));
        assert_eq!(
            to_string(&person).unwrap(),
            r#"{"name":"Bob","years":5,"email":"b@example.com"}"#
        );
    }

    #[test]
    fn test_record_introspection() {
        let person: Person =
            from_str(r#"{"name":"Ada","email":"a@b","tags":["t"]}"#).unwrap();
        let view = ValueRef::new(&person);
        assert_eq!(view.size(), 3);
        let names: Vec<_> = view.iter().map(|(name, _)| name.into_owned()).collect();
        assert_eq!(names, vec!["name", "email", "tags"]);
        assert_eq!(view.get("email").and_then(|v| v.as_str()), Some("a@b"));
        assert!(view.get("years").is_none());
        assert_eq!(view.resolve_path("/tags/0").and_then(|v| v.as_str()), Some("t"));
    }

    #[test]
    fn test_finalize_record() {
        let mut person: Person = from_str(r#"{"name":"Ada","tags":["a"]}"#).unwrap();
        person.finalize();
        assert_eq!(person, Person::default());
        assert!(!person.has("name"));
        person.finalize();
        assert_eq!(person, Person::default());
    }

    #[test]
    fn test_duplicate_member_last_wins() {
        let person: Person = from_str(r#"{"name":"a","name":"b"}"#).unwrap();
        assert_eq!(person.name, "b");
    }

    #[test]
    fn test_field_table() {
        let names: Vec<_> = Person::FIELDS.iter().map(|field| field.name).collect();
        assert_eq!(names, vec!["name", "years", "email", "tags"]);
        assert_eq!(Person::metadata().json_type(), crate::JsonType::Object);
    }

    #[test]
    fn test_record_wider_than_one_presence_word() {
        let wide: Wide = from_str(r#"{"m0":1,"m64":2,"m69":3}"#).unwrap();
        assert_eq!((wide.m0, wide.m64, wide.m69), (1, 2, 3));
        assert!(wide.has("m64"));
        assert!(wide.has("m69"));
        assert!(!wide.has("m63"));
        assert!(!wide.has("m1"));
        assert_eq!(ValueRef::new(&wide).size(), 3);
        assert_eq!(to_string(&wide).unwrap(), r#"{"m0":1,"m64":2,"m69":3}"#);

        let mut wide = Wide::default();
        wide.mark_all_present();
        assert_eq!(ValueRef::new(&wide).size(), 70);
    }
}
