//! Type tags, the [`Value`] tagged union, and the Rust types that map onto them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::CodecError;

/// The type of a record field, as declared in its schema.
///
/// Canonical names follow the type names used by the stores that already
/// hold data in this format (`int8`, `[]uint8`, `[]string`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeTag {
    Int8,
    Int16,
    Int32,
    Int64,
    /// Platform-width signed integer.
    Int,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    /// Platform-width unsigned integer.
    Uint,
    /// Pointer-sized unsigned integer.
    Uintptr,
    Float32,
    Float64,
    String,
    Bool,
    /// Byte sequence.
    Bytes,
    /// String sequence.
    Strings,
}

impl TypeTag {
    /// Every supported tag, in declaration order.
    pub const ALL: [TypeTag; 17] = [
        TypeTag::Int8,
        TypeTag::Int16,
        TypeTag::Int32,
        TypeTag::Int64,
        TypeTag::Int,
        TypeTag::Uint8,
        TypeTag::Uint16,
        TypeTag::Uint32,
        TypeTag::Uint64,
        TypeTag::Uint,
        TypeTag::Uintptr,
        TypeTag::Float32,
        TypeTag::Float64,
        TypeTag::String,
        TypeTag::Bool,
        TypeTag::Bytes,
        TypeTag::Strings,
    ];

    /// Canonical type name.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Int8 => "int8",
            TypeTag::Int16 => "int16",
            TypeTag::Int32 => "int32",
            TypeTag::Int64 => "int64",
            TypeTag::Int => "int",
            TypeTag::Uint8 => "uint8",
            TypeTag::Uint16 => "uint16",
            TypeTag::Uint32 => "uint32",
            TypeTag::Uint64 => "uint64",
            TypeTag::Uint => "uint",
            TypeTag::Uintptr => "uintptr",
            TypeTag::Float32 => "float32",
            TypeTag::Float64 => "float64",
            TypeTag::String => "string",
            TypeTag::Bool => "bool",
            TypeTag::Bytes => "[]uint8",
            TypeTag::Strings => "[]string",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeTag {
    type Err = CodecError;

    /// Parse a canonical name or one of the aliases `byte`, `rune`, `bytes`,
    /// `[]byte` and `strings`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.trim() {
            "byte" => TypeTag::Uint8,
            "rune" => TypeTag::Int32,
            "bytes" | "[]byte" => TypeTag::Bytes,
            "strings" => TypeTag::Strings,
            name => TypeTag::ALL
                .into_iter()
                .find(|t| t.name() == name)
                .ok_or_else(|| CodecError::UnsupportedType(name.to_owned()))?,
        };
        Ok(tag)
    }
}

impl TryFrom<String> for TypeTag {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.name().to_owned()
    }
}

/// A single field value of one of the supported kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int(isize),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Uint(usize),
    Uintptr(usize),
    Float32(f32),
    Float64(f64),
    String(String),
    Bool(bool),
    Bytes(Vec<u8>),
    Strings(Vec<String>),
}

impl Value {
    /// The tag describing this value's kind.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Int8(_) => TypeTag::Int8,
            Value::Int16(_) => TypeTag::Int16,
            Value::Int32(_) => TypeTag::Int32,
            Value::Int64(_) => TypeTag::Int64,
            Value::Int(_) => TypeTag::Int,
            Value::Uint8(_) => TypeTag::Uint8,
            Value::Uint16(_) => TypeTag::Uint16,
            Value::Uint32(_) => TypeTag::Uint32,
            Value::Uint64(_) => TypeTag::Uint64,
            Value::Uint(_) => TypeTag::Uint,
            Value::Uintptr(_) => TypeTag::Uintptr,
            Value::Float32(_) => TypeTag::Float32,
            Value::Float64(_) => TypeTag::Float64,
            Value::String(_) => TypeTag::String,
            Value::Bool(_) => TypeTag::Bool,
            Value::Bytes(_) => TypeTag::Bytes,
            Value::Strings(_) => TypeTag::Strings,
        }
    }

    /// The zero value of `tag`, used to fill freshly allocated dynamic records.
    pub fn zero(tag: TypeTag) -> Self {
        match tag {
            TypeTag::Int8 => Value::Int8(0),
            TypeTag::Int16 => Value::Int16(0),
            TypeTag::Int32 => Value::Int32(0),
            TypeTag::Int64 => Value::Int64(0),
            TypeTag::Int => Value::Int(0),
            TypeTag::Uint8 => Value::Uint8(0),
            TypeTag::Uint16 => Value::Uint16(0),
            TypeTag::Uint32 => Value::Uint32(0),
            TypeTag::Uint64 => Value::Uint64(0),
            TypeTag::Uint => Value::Uint(0),
            TypeTag::Uintptr => Value::Uintptr(0),
            TypeTag::Float32 => Value::Float32(0.0),
            TypeTag::Float64 => Value::Float64(0.0),
            TypeTag::String => Value::String(String::new()),
            TypeTag::Bool => Value::Bool(false),
            TypeTag::Bytes => Value::Bytes(Vec::new()),
            TypeTag::Strings => Value::Strings(Vec::new()),
        }
    }
}

/// Pointer-sized unsigned integer field.
///
/// `usize` fields map to [`TypeTag::Uint`]; wrap a field in `Uintptr` to
/// declare it as [`TypeTag::Uintptr`] instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uintptr(pub usize);

/// A Rust type that can be stored in a record field.
pub trait FieldType: Sized {
    /// Tag declared for fields of this type.
    const TYPE_TAG: TypeTag;

    /// Snapshot the field as a [`Value`].
    fn to_value(&self) -> Value;

    /// Convert a [`Value`] back into the field type.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TypeMismatch`] if `value` is of another kind.
    fn from_value(value: Value) -> Result<Self, CodecError>;
}

macro_rules! impl_field_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FieldType for $ty {
                const TYPE_TAG: TypeTag = TypeTag::$variant;

                fn to_value(&self) -> Value {
                    Value::$variant(self.clone())
                }

                fn from_value(value: Value) -> Result<Self, CodecError> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(CodecError::TypeMismatch {
                            expected: TypeTag::$variant,
                            found: other.type_tag(),
                        }),
                    }
                }
            }
        )*
    };
}

impl_field_type! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    isize => Int,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    usize => Uint,
    f32 => Float32,
    f64 => Float64,
    String => String,
    bool => Bool,
    Vec<u8> => Bytes,
    Vec<String> => Strings,
}

impl FieldType for Uintptr {
    const TYPE_TAG: TypeTag = TypeTag::Uintptr;

    fn to_value(&self) -> Value {
        Value::Uintptr(self.0)
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Uintptr(v) => Ok(Uintptr(v)),
            other => Err(CodecError::TypeMismatch {
                expected: TypeTag::Uintptr,
                found: other.type_tag(),
            }),
        }
    }
}
