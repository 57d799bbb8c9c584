use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{ErrorKind, Result};
use crate::proto::Endianness;
use crate::signature::{Signature, SignatureError, Type, MAX_SIGNATURE};
use crate::Value;

use super::{padding_to, MAX_ARRAY_LENGTH};

macro_rules! store_number {
    ($($name:ident, $ty:ty, $write:ident, $size:expr),* $(,)?) => {
        $(
            #[inline]
            pub(crate) fn $name(&mut self, value: $ty) {
                self.align($size);
                let mut bytes = [0u8; $size];

                match self.endianness {
                    Endianness::BIG => BigEndian::$write(&mut bytes, value),
                    _ => LittleEndian::$write(&mut bytes, value),
                }

                self.data.extend_from_slice(&bytes);
            }
        )*
    }
}

/// A growable buffer which values are encoded into.
///
/// # Examples
///
/// ```
/// use dbus_peer::buf::WriteBuf;
/// use dbus_peer::proto::Endianness;
/// use dbus_peer::signature::Signature;
/// use dbus_peer::Value;
///
/// let mut buf = WriteBuf::with_endianness(Endianness::BIG);
/// buf.store_body(&[Value::from(7u8), Value::from(1u32)], &Signature::new("yu")?)?;
///
/// assert_eq!(buf.get(), &[7, 0, 0, 0, 0, 0, 0, 1]);
/// # Ok::<_, dbus_peer::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct WriteBuf {
    data: Vec<u8>,
    endianness: Endianness,
}

impl WriteBuf {
    /// Construct a new empty buffer using native endianness.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a new empty buffer with the given endianness.
    pub fn with_endianness(endianness: Endianness) -> Self {
        Self {
            data: Vec::new(),
            endianness,
        }
    }

    /// The endianness of the buffer.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The encoded bytes.
    #[inline]
    pub fn get(&self) -> &[u8] {
        &self.data
    }

    /// The number of encoded bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Test if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Clear the buffer.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Convert into the encoded bytes.
    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Pad with zeros up to the given alignment.
    #[inline]
    pub fn align(&mut self, align: usize) {
        let padding = padding_to(self.data.len(), align);
        self.data.resize(self.data.len() + padding, 0);
    }

    /// Append raw bytes without alignment.
    #[inline]
    pub(crate) fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    #[inline]
    pub(crate) fn store_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    store_number! {
        store_u16, u16, write_u16, 2,
        store_i16, i16, write_i16, 2,
        store_u32, u32, write_u32, 4,
        store_i32, i32, write_i32, 4,
        store_u64, u64, write_u64, 8,
        store_i64, i64, write_i64, 8,
        store_f64, f64, write_f64, 8,
    }

    /// Overwrite a previously reserved `u32` at `at`.
    pub(crate) fn patch_u32(&mut self, at: usize, value: u32) {
        if let Some(bytes) = self.data.get_mut(at..at + 4) {
            match self.endianness {
                Endianness::BIG => BigEndian::write_u32(bytes, value),
                _ => LittleEndian::write_u32(bytes, value),
            }
        }
    }

    /// Store a length-prefixed, nul-terminated string.
    pub(crate) fn store_str(&mut self, string: &str) -> Result<()> {
        let Ok(len) = u32::try_from(string.len()) else {
            return Err(ErrorKind::ArrayTooLong(u32::MAX).into());
        };

        self.store_u32(len);
        self.data.extend_from_slice(string.as_bytes());
        self.data.push(0);
        Ok(())
    }

    /// Store a signature with a single byte length prefix.
    pub(crate) fn store_signature(&mut self, signature: &str) -> Result<()> {
        if signature.len() > MAX_SIGNATURE {
            return Err(SignatureError::too_long().into());
        }

        self.data.push(signature.len() as u8);
        self.data.extend_from_slice(signature.as_bytes());
        self.data.push(0);
        Ok(())
    }

    /// Store a value of the given type.
    ///
    /// # Errors
    ///
    /// Errors with [`ErrorKind::ValueMismatch`] if the value does not have
    /// the shape of `ty`.
    pub fn store(&mut self, value: &Value, ty: &Type) -> Result<()> {
        match (ty, value) {
            (Type::Byte, Value::Byte(v)) => self.store_u8(*v),
            (Type::Boolean, Value::Boolean(v)) => self.store_u32(u32::from(*v)),
            (Type::Int16, Value::Int16(v)) => self.store_i16(*v),
            (Type::UInt16, Value::UInt16(v)) => self.store_u16(*v),
            (Type::Int32, Value::Int32(v)) => self.store_i32(*v),
            (Type::UInt32, Value::UInt32(v)) => self.store_u32(*v),
            (Type::Int64, Value::Int64(v)) => self.store_i64(*v),
            (Type::UInt64, Value::UInt64(v)) => self.store_u64(*v),
            (Type::Double, Value::Double(v)) => self.store_f64(*v),
            (Type::UnixFd, Value::UnixFd(v)) => self.store_u32(*v),
            (Type::String, Value::String(v)) => self.store_str(v)?,
            (Type::ObjectPath, Value::ObjectPath(v)) => self.store_str(v.as_str())?,
            (Type::Signature, Value::Signature(v)) => self.store_signature(v.as_str())?,
            (Type::Variant, Value::Variant(inner)) => {
                let inner_ty = inner.ty();
                self.store_signature(&inner_ty.to_string())?;
                self.store(inner, &inner_ty)?;
            }
            (Type::Array(element), Value::Array(array)) if array.element() == &**element => {
                self.align(4);
                let length_at = self.data.len();
                self.store_u32(0);

                // NB: padding to the element is not part of the array length.
                self.align(element.alignment());
                let start = self.data.len();

                for value in array.values() {
                    self.store(value, element)?;
                }

                let length = self.data.len() - start;

                let length = match u32::try_from(length) {
                    Ok(length) if length <= MAX_ARRAY_LENGTH => length,
                    _ => return Err(ErrorKind::ArrayTooLong(u32::MAX).into()),
                };

                self.patch_u32(length_at, length);
            }
            (Type::Struct(fields), Value::Struct(values)) if fields.len() == values.len() => {
                self.align(8);

                for (value, field) in values.iter().zip(fields) {
                    self.store(value, field)?;
                }
            }
            (Type::DictEntry(key_ty, value_ty), Value::DictEntry(key, value)) => {
                self.align(8);
                self.store(key, key_ty)?;
                self.store(value, value_ty)?;
            }
            (ty, _) => {
                return Err(ErrorKind::ValueMismatch {
                    expected: ty.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Store a sequence of values matching the complete types of `signature`.
    pub fn store_body(&mut self, values: &[Value], signature: &Signature) -> Result<()> {
        if values.len() != signature.types().len() {
            return Err(ErrorKind::ValueMismatch {
                expected: signature.to_string(),
            }
            .into());
        }

        for (value, ty) in values.iter().zip(signature.types()) {
            self.store(value, ty)?;
        }

        Ok(())
    }
}
