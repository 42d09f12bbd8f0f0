//! The `record!` macro.

/// Declares a struct and implements [`Record`](crate::Record) and
/// [`Mappable`](crate::Mappable) for it.
///
/// Every field type must implement [`Mappable`](crate::Mappable) and the
/// struct must derive `Clone` and `Default`. Implement
/// [`Entity`](crate::Entity) next to it, either empty for the default schema
/// or with a custom [`Entity::schema`](crate::Entity::schema).
///
/// ```
/// use entimap_core::{record, Entity, Record};
///
/// record! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct Point {
///         pub x: i64,
///         pub y: i64,
///     }
/// }
///
/// impl Entity for Point {}
///
/// let p = Point { x: 1, y: 2 };
/// assert_eq!(p.get_field("y").unwrap().into_value::<i64>().unwrap(), 2);
/// assert_eq!(Point::declared_fields().len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            fn record_type(&self) -> $crate::RecordType {
                $crate::RecordType::of::<Self>()
            }

            fn get_field(&self, name: &str) -> ::core::option::Option<$crate::Dynamic> {
                match name {
                    $(
                        stringify!($field) => ::core::option::Option::Some(
                            $crate::Mappable::to_dynamic(&self.$field),
                        ),
                    )*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field(&mut self, name: &str, value: $crate::Dynamic) -> $crate::MapperResult<()> {
                match name {
                    $(
                        stringify!($field) => {
                            self.$field = <$ty as $crate::Mappable>::from_dynamic(value)?;
                            ::core::result::Result::Ok(())
                        }
                    )*
                    _ => {
                        let _ = value;
                        ::core::result::Result::Err($crate::MapperError::unknown_field(
                            stringify!($name),
                            name,
                        ))
                    }
                }
            }

            fn clone_record(&self) -> ::std::boxed::Box<dyn $crate::Record> {
                ::std::boxed::Box::new(::core::clone::Clone::clone(self))
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
                self
            }

            fn declared_fields() -> ::std::vec::Vec<$crate::FieldInfo> {
                ::std::vec![
                    $( $crate::FieldInfo::of::<$ty>(stringify!($field)), )*
                ]
            }
        }

        impl $crate::Mappable for $name {
            fn type_ref() -> $crate::TypeRef {
                $crate::TypeRef::Record($crate::RecordType::of::<Self>())
            }

            fn to_dynamic(&self) -> $crate::Dynamic {
                $crate::Dynamic::Record(::std::boxed::Box::new(::core::clone::Clone::clone(self)))
            }

            fn from_dynamic(value: $crate::Dynamic) -> $crate::MapperResult<Self> {
                $crate::downcast_record::<Self>(value)
            }
        }
    };
}
