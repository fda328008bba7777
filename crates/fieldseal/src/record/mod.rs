//! Record shapes the orchestrator can walk.
//!
//! A [`Record`] exposes an ordered list of [`FieldSpec`]s plus an accessor and
//! a mutator per field position. Compile-time shapes get the implementation
//! from [`sealed_record!`](crate::sealed_record); shapes only known at runtime
//! use [`DynamicRecord`].

pub mod dynamic;
pub mod encrypted;

pub use dynamic::DynamicRecord;
pub use encrypted::{EncryptedRecord, FieldValue};

use crate::codec::{CodecError, Value};
use crate::schema::FieldSpec;

/// A flat record whose fields can be read and written by position.
pub trait Record {
    /// Field declarations in declaration order.
    fn field_specs(&self) -> Vec<FieldSpec>;

    /// Snapshot of the field at `index`, or `None` past the last field.
    fn field_value(&self, index: usize) -> Option<Value>;

    /// Overwrite the field at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TypeMismatch`] if `value` is not of the field's
    /// declared type, and [`CodecError::NoSuchField`] past the last field.
    fn set_field_value(&mut self, index: usize, value: Value) -> Result<(), CodecError>;

    /// A freshly allocated instance of the same shape with every field zeroed.
    fn blank(&self) -> Self
    where
        Self: Sized;
}

/// Declare a struct and implement [`Record`] for it.
///
/// Each field lists its tags in brackets after `=>`. The struct must derive
/// `Default`, which supplies [`Record::blank`].
///
/// ```
/// use fieldseal::sealed_record;
///
/// sealed_record! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct Person {
///         pub name: String => [bson = "Name", encrypted = "false"],
///         pub score: f64 => [bson = "Score"],
///     }
/// }
/// ```
#[macro_export]
macro_rules! sealed_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty => [$($tag:ident = $tag_value:literal),* $(,)?]
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::record::Record for $name {
            fn field_specs(&self) -> ::std::vec::Vec<$crate::schema::FieldSpec> {
                ::std::vec![
                    $(
                        $crate::schema::FieldSpec::new(
                            ::std::stringify!($field),
                            <$ty as $crate::codec::FieldType>::TYPE_TAG,
                            $crate::schema::FieldTags::from_pairs(&[
                                $((::std::stringify!($tag), $tag_value)),*
                            ]),
                        ),
                    )*
                ]
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field_value(&self, index: usize) -> ::std::option::Option<$crate::codec::Value> {
                let mut position = 0usize;
                $(
                    if position == index {
                        return ::std::option::Option::Some(
                            <$ty as $crate::codec::FieldType>::to_value(&self.$field),
                        );
                    }
                    position += 1;
                )*
                ::std::option::Option::None
            }

            #[allow(unused_assignments, unused_mut)]
            fn set_field_value(
                &mut self,
                index: usize,
                value: $crate::codec::Value,
            ) -> ::std::result::Result<(), $crate::codec::CodecError> {
                let mut position = 0usize;
                $(
                    if position == index {
                        self.$field = <$ty as $crate::codec::FieldType>::from_value(value)?;
                        return ::std::result::Result::Ok(());
                    }
                    position += 1;
                )*
                ::std::result::Result::Err($crate::codec::CodecError::NoSuchField(index))
            }

            fn blank(&self) -> Self {
                <Self as ::std::default::Default>::default()
            }
        }
    };
}
