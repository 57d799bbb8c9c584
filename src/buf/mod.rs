//! The signature-driven binary codec.
//!
//! Every value is aligned relative to the start of the buffer it is written
//! to or read from, which for messages is the start of the message.

#[cfg(test)]
mod tests;

pub use self::read_buf::ReadBuf;
mod read_buf;

pub use self::write_buf::WriteBuf;
mod write_buf;

use crate::error::Result;
use crate::proto::Endianness;
use crate::signature::Type;
use crate::Value;

/// The maximum length of an array in bytes.
pub(crate) const MAX_ARRAY_LENGTH: u32 = 1u32 << 26;

/// The maximum length of a body in bytes.
pub(crate) const MAX_BODY_LENGTH: u32 = 1u32 << 27;

/// The maximum length of a whole message in bytes.
pub(crate) const MAX_MESSAGE_LENGTH: usize = 1usize << 27;

/// Calculate padding with the assumption that alignment is a power of two.
#[inline(always)]
pub(crate) fn padding_to(len: usize, align: usize) -> usize {
    let mask = align - 1;
    (align - (len & mask)) & mask
}

/// Encode a single value of the given type at the end of `buf`.
///
/// # Examples
///
/// ```
/// use dbus_peer::buf::{encode, WriteBuf};
/// use dbus_peer::proto::Endianness;
/// use dbus_peer::signature::Type;
/// use dbus_peer::Value;
///
/// let mut buf = WriteBuf::with_endianness(Endianness::LITTLE);
/// encode(&Value::from("foo"), &Type::String, &mut buf)?;
///
/// assert_eq!(buf.get(), &[3, 0, 0, 0, b'f', b'o', b'o', 0]);
/// # Ok::<_, dbus_peer::Error>(())
/// ```
#[inline]
pub fn encode(value: &Value, ty: &Type, buf: &mut WriteBuf) -> Result<()> {
    buf.store(value, ty)
}

/// Decode a single value of the given type from `data` starting at
/// `offset`, returning the value and the offset just past it.
///
/// # Examples
///
/// ```
/// use dbus_peer::buf::decode;
/// use dbus_peer::proto::Endianness;
/// use dbus_peer::signature::Type;
/// use dbus_peer::Value;
///
/// let data = [0xff, 0, 0, 0, 42, 0, 0, 0];
/// let (value, offset) = decode(&data, 1, &Type::UInt32, Endianness::LITTLE)?;
///
/// assert_eq!(value, Value::UInt32(42));
/// assert_eq!(offset, 8);
/// # Ok::<_, dbus_peer::Error>(())
/// ```
#[inline]
pub fn decode(
    data: &[u8],
    offset: usize,
    ty: &Type,
    endianness: Endianness,
) -> Result<(Value, usize)> {
    let mut buf = ReadBuf::with_position(data, offset, endianness);
    let value = buf.load(ty)?;
    Ok((value, buf.position()))
}
