use std::str;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{ErrorKind, Result};
use crate::proto::Endianness;
use crate::signature::{parse_single, Signature, Type, MAX_DEPTH};
use crate::value::Array;
use crate::{ObjectPath, Value};

use super::{padding_to, MAX_ARRAY_LENGTH};

macro_rules! load_number {
    ($($name:ident, $ty:ty, $read:ident, $size:expr),* $(,)?) => {
        $(
            #[inline]
            pub(crate) fn $name(&mut self) -> Result<$ty> {
                self.align($size)?;
                let bytes = self.take($size)?;

                Ok(match self.endianness {
                    Endianness::BIG => BigEndian::$read(bytes),
                    _ => LittleEndian::$read(bytes),
                })
            }
        )*
    }
}

/// A cursor over encoded bytes which values are decoded from.
///
/// Positions are absolute offsets into the underlying slice, so alignment is
/// computed relative to its start.
///
/// # Examples
///
/// ```
/// use dbus_peer::buf::ReadBuf;
/// use dbus_peer::proto::Endianness;
/// use dbus_peer::signature::Signature;
/// use dbus_peer::Value;
///
/// let data = [3, 0, 0, 0, b'f', b'o', b'o', 0];
/// let mut buf = ReadBuf::new(&data, Endianness::LITTLE);
///
/// let body = buf.load_body(&Signature::new("s")?)?;
/// assert_eq!(body, [Value::from("foo")]);
/// assert!(buf.is_empty());
/// # Ok::<_, dbus_peer::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReadBuf<'a> {
    data: &'a [u8],
    pos: usize,
    endianness: Endianness,
    depth: usize,
}

impl<'a> ReadBuf<'a> {
    /// Construct a new buffer reading from the start of `data`.
    pub fn new(data: &'a [u8], endianness: Endianness) -> Self {
        Self::with_position(data, 0, endianness)
    }

    /// Construct a new buffer reading from `pos` in `data`.
    pub fn with_position(data: &'a [u8], pos: usize, endianness: Endianness) -> Self {
        Self {
            data,
            pos,
            endianness,
            depth: 0,
        }
    }

    /// The current read position.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The endianness values are decoded with.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The number of bytes which remain to be read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Test if there are no more bytes to read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Skip padding up to the given alignment.
    #[inline]
    pub fn align(&mut self, align: usize) -> Result<()> {
        let padding = padding_to(self.pos, align);
        self.take(padding)?;
        Ok(())
    }

    /// Take exactly `n` bytes.
    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let data = self.data;

        let Some(bytes) = data.get(self.pos..self.pos.saturating_add(n)) else {
            return Err(ErrorKind::BufferUnderrun {
                needed: n,
                available: self.remaining(),
            }
            .into());
        };

        self.pos += n;
        Ok(bytes)
    }

    #[inline]
    pub(crate) fn load_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    load_number! {
        load_u16, u16, read_u16, 2,
        load_i16, i16, read_i16, 2,
        load_u32, u32, read_u32, 4,
        load_i32, i32, read_i32, 4,
        load_u64, u64, read_u64, 8,
        load_i64, i64, read_i64, 8,
        load_f64, f64, read_f64, 8,
    }

    /// Load `len` bytes followed by a mandatory nul byte as a string.
    fn load_nul_terminated(&mut self, len: usize) -> Result<&'a str> {
        let bytes = self.take(len)?;

        if self.load_u8()? != 0 {
            return Err(ErrorKind::NotNulTerminated.into());
        }

        Ok(str::from_utf8(bytes)?)
    }

    /// Load a length-prefixed string.
    pub(crate) fn load_str(&mut self) -> Result<&'a str> {
        let len = self.load_u32()? as usize;
        self.load_nul_terminated(len)
    }

    /// Load a signature with a single byte length prefix.
    pub(crate) fn load_signature(&mut self) -> Result<&'a str> {
        let len = self.load_u8()? as usize;
        self.load_nul_terminated(len)
    }

    /// Load a value of the given type.
    pub fn load(&mut self, ty: &Type) -> Result<Value> {
        let value = match ty {
            Type::Byte => Value::Byte(self.load_u8()?),
            Type::Boolean => match self.load_u32()? {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                n => return Err(ErrorKind::InvalidBoolean(n).into()),
            },
            Type::Int16 => Value::Int16(self.load_i16()?),
            Type::UInt16 => Value::UInt16(self.load_u16()?),
            Type::Int32 => Value::Int32(self.load_i32()?),
            Type::UInt32 => Value::UInt32(self.load_u32()?),
            Type::Int64 => Value::Int64(self.load_i64()?),
            Type::UInt64 => Value::UInt64(self.load_u64()?),
            Type::Double => Value::Double(self.load_f64()?),
            Type::UnixFd => Value::UnixFd(self.load_u32()?),
            Type::String => Value::String(self.load_str()?.to_owned()),
            Type::ObjectPath => Value::ObjectPath(ObjectPath::new(self.load_str()?)?),
            Type::Signature => Value::Signature(Signature::new(self.load_signature()?)?),
            Type::Variant => {
                let inner = parse_single(self.load_signature()?)?;
                self.enter()?;
                let value = self.load(&inner);
                self.depth -= 1;
                Value::Variant(Box::new(value?))
            }
            Type::Array(element) => {
                self.enter()?;
                let array = self.load_array(element);
                self.depth -= 1;
                Value::Array(array?)
            }
            Type::Struct(fields) => {
                self.enter()?;
                let values = self.load_struct(fields);
                self.depth -= 1;
                Value::Struct(values?)
            }
            Type::DictEntry(key_ty, value_ty) => {
                self.enter()?;
                let entry = self.load_dict_entry(key_ty, value_ty);
                self.depth -= 1;
                let (key, value) = entry?;
                Value::DictEntry(Box::new(key), Box::new(value))
            }
        };

        Ok(value)
    }

    /// Load a sequence of values matching the complete types of `signature`.
    pub fn load_body(&mut self, signature: &Signature) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(signature.types().len());

        for ty in signature.types() {
            values.push(self.load(ty)?);
        }

        Ok(values)
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(ErrorKind::NestingTooDeep.into());
        }

        self.depth += 1;
        Ok(())
    }

    fn load_array(&mut self, element: &Type) -> Result<Array> {
        let declared = self.load_u32()?;

        if declared > MAX_ARRAY_LENGTH {
            return Err(ErrorKind::ArrayTooLong(declared).into());
        }

        self.align(element.alignment())?;

        let start = self.pos;
        let end = start + declared as usize;

        if end > self.data.len() {
            return Err(ErrorKind::BufferUnderrun {
                needed: declared as usize,
                available: self.remaining(),
            }
            .into());
        }

        let mut array = Array::empty(element.clone());

        while self.pos < end {
            array.push_unchecked(self.load(element)?);
        }

        if self.pos != end {
            return Err(ErrorKind::ArrayLengthMismatch {
                declared,
                consumed: self.pos - start,
            }
            .into());
        }

        Ok(array)
    }

    fn load_struct(&mut self, fields: &[Type]) -> Result<Vec<Value>> {
        self.align(8)?;
        let mut values = Vec::with_capacity(fields.len());

        for field in fields {
            values.push(self.load(field)?);
        }

        Ok(values)
    }

    fn load_dict_entry(&mut self, key: &Type, value: &Type) -> Result<(Value, Value)> {
        self.align(8)?;
        let key = self.load(key)?;
        let value = self.load(value)?;
        Ok((key, value))
    }
}
