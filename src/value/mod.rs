//! Dynamically typed D-Bus values.

#[cfg(test)]
mod tests;

pub use self::array::Array;
mod array;

use crate::error::{ErrorKind, Result};
use crate::signature::{Signature, Type};
use crate::ObjectPath;

/// A single D-Bus value whose shape is described by a [`Type`].
///
/// # Examples
///
/// ```
/// use dbus_peer::signature::Type;
/// use dbus_peer::Value;
///
/// let value = Value::dict(
///     Type::String,
///     Type::String,
///     [(Value::from("k"), Value::from("v"))],
/// )?;
///
/// assert_eq!(value.ty().to_string(), "a{ss}");
/// # Ok::<_, dbus_peer::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 8-bit unsigned integer.
    Byte(u8),
    /// Boolean value.
    Boolean(bool),
    /// 16-bit signed integer.
    Int16(i16),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// IEEE 754 double.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Object path.
    ObjectPath(ObjectPath),
    /// Type signature.
    Signature(Signature),
    /// Index into the out-of-band file descriptors of a message.
    UnixFd(u32),
    /// A value which carries its own type.
    Variant(Box<Value>),
    /// A homogeneous array.
    Array(Array),
    /// A struct of ordered fields.
    Struct(Vec<Value>),
    /// A dict entry, which is only valid as the element of an array.
    DictEntry(Box<Value>, Box<Value>),
}

impl Value {
    /// Construct a variant wrapping the given value.
    #[inline]
    pub fn variant(value: impl Into<Value>) -> Self {
        Value::Variant(Box::new(value.into()))
    }

    /// Construct an array with the given element type.
    ///
    /// # Errors
    ///
    /// Errors if any of the values does not conform to `element`.
    pub fn array(element: Type, values: impl IntoIterator<Item = Value>) -> Result<Self> {
        Ok(Value::Array(Array::new(element, values)?))
    }

    /// Construct an `a{kv}` dict from key-value pairs.
    ///
    /// # Errors
    ///
    /// Errors if `key` is not a basic type or if any entry does not conform to
    /// the key and value types.
    pub fn dict(
        key: Type,
        value: Type,
        entries: impl IntoIterator<Item = (Value, Value)>,
    ) -> Result<Self> {
        if !key.is_basic() {
            return Err(ErrorKind::ValueMismatch {
                expected: Type::dict(key, value).to_string(),
            }
            .into());
        }

        let element = Type::DictEntry(Box::new(key), Box::new(value));

        let values = entries
            .into_iter()
            .map(|(k, v)| Value::DictEntry(Box::new(k), Box::new(v)));

        Self::array(element, values)
    }

    /// The type of the value.
    pub fn ty(&self) -> Type {
        match self {
            Value::Byte(..) => Type::Byte,
            Value::Boolean(..) => Type::Boolean,
            Value::Int16(..) => Type::Int16,
            Value::UInt16(..) => Type::UInt16,
            Value::Int32(..) => Type::Int32,
            Value::UInt32(..) => Type::UInt32,
            Value::Int64(..) => Type::Int64,
            Value::UInt64(..) => Type::UInt64,
            Value::Double(..) => Type::Double,
            Value::String(..) => Type::String,
            Value::ObjectPath(..) => Type::ObjectPath,
            Value::Signature(..) => Type::Signature,
            Value::UnixFd(..) => Type::UnixFd,
            Value::Variant(..) => Type::Variant,
            Value::Array(array) => Type::Array(Box::new(array.element().clone())),
            Value::Struct(fields) => Type::Struct(fields.iter().map(Value::ty).collect()),
            Value::DictEntry(key, value) => {
                Type::DictEntry(Box::new(key.ty()), Box::new(value.ty()))
            }
        }
    }

    /// Test if the value has the exact shape described by `ty`.
    pub fn conforms_to(&self, ty: &Type) -> bool {
        match (self, ty) {
            (Value::Byte(..), Type::Byte)
            | (Value::Boolean(..), Type::Boolean)
            | (Value::Int16(..), Type::Int16)
            | (Value::UInt16(..), Type::UInt16)
            | (Value::Int32(..), Type::Int32)
            | (Value::UInt32(..), Type::UInt32)
            | (Value::Int64(..), Type::Int64)
            | (Value::UInt64(..), Type::UInt64)
            | (Value::Double(..), Type::Double)
            | (Value::String(..), Type::String)
            | (Value::ObjectPath(..), Type::ObjectPath)
            | (Value::Signature(..), Type::Signature)
            | (Value::UnixFd(..), Type::UnixFd)
            | (Value::Variant(..), Type::Variant) => true,
            (Value::Array(array), Type::Array(element)) => array.element() == &**element,
            (Value::Struct(values), Type::Struct(fields)) => {
                values.len() == fields.len()
                    && values.iter().zip(fields).all(|(v, t)| v.conforms_to(t))
            }
            (Value::DictEntry(k, v), Type::DictEntry(kt, vt)) => {
                k.conforms_to(kt) && v.conforms_to(vt)
            }
            _ => false,
        }
    }

    /// Get the value as a string slice, if it is a string-like value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(string) => Some(string),
            Value::ObjectPath(path) => Some(path.as_str()),
            Value::Signature(signature) => Some(signature.as_str()),
            _ => None,
        }
    }

    /// Get the value as a `u32`, if it is a `UInt32`.
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::UInt32(value) => Some(value),
            _ => None,
        }
    }

    /// Get the value as a `bool`, if it is a `Boolean`.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(value) => Some(value),
            _ => None,
        }
    }

    /// Get the elements of an array value.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(array) => Some(array.values()),
            _ => None,
        }
    }

    /// Get the value inside of a variant.
    pub fn as_variant(&self) -> Option<&Value> {
        match self {
            Value::Variant(value) => Some(value),
            _ => None,
        }
    }

    /// Iterate over the key-value pairs of a dict value.
    ///
    /// Returns `None` if the value is not an array of dict entries.
    pub fn dict_entries(&self) -> Option<impl Iterator<Item = (&Value, &Value)> + '_> {
        let Value::Array(array) = self else {
            return None;
        };

        if !matches!(array.element(), Type::DictEntry(..)) {
            return None;
        }

        Some(array.values().iter().filter_map(|entry| match entry {
            Value::DictEntry(key, value) => Some((&**key, &**value)),
            _ => None,
        }))
    }
}

macro_rules! from_primitive {
    ($($ty:ty, $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    }
}

from_primitive! {
    u8, Byte,
    bool, Boolean,
    i16, Int16,
    u16, UInt16,
    i32, Int32,
    u32, UInt32,
    i64, Int64,
    u64, UInt64,
    f64, Double,
    String, String,
    ObjectPath, ObjectPath,
    Signature, Signature,
    Array, Array,
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<&[u8]> for Value {
    #[inline]
    fn from(value: &[u8]) -> Self {
        Value::Array(Array::from_bytes(value))
    }
}
