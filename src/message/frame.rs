use std::num::NonZeroU32;

use crate::buf::{padding_to, ReadBuf, WriteBuf, MAX_ARRAY_LENGTH, MAX_BODY_LENGTH, MAX_MESSAGE_LENGTH};
use crate::error::{Error, ErrorKind, Result};
use crate::proto::{
    Endianness, Flags, Header, HeaderField, MessageType, FIXED_HEADER_LENGTH, PROTOCOL_VERSION,
};
use crate::signature::{Signature, Type};
use crate::{Message, MessageKind, ObjectPath, Value};

/// The `a(yv)` type of the header fields array.
fn header_fields_type() -> Type {
    Type::Array(Box::new(header_field_type()))
}

fn header_field_type() -> Type {
    Type::Struct(vec![Type::Byte, Type::Variant])
}

/// Read the fixed part of a message header.
///
/// Returns `None` if fewer than [`FIXED_HEADER_LENGTH`] bytes are available.
fn read_header(data: &[u8]) -> Result<Option<(Header, u32)>> {
    if data.len() < FIXED_HEADER_LENGTH {
        return Ok(None);
    }

    let endianness = Endianness::new(data[0]);

    if !endianness.is_known() {
        return Err(ErrorKind::InvalidEndianness(data[0]).into());
    }

    let mut buf = ReadBuf::with_position(&data[..FIXED_HEADER_LENGTH], 1, endianness);

    let message_type = MessageType::new(buf.load_u8()?);
    let flags = Flags::from_bits(buf.load_u8()?);
    let version = buf.load_u8()?;

    if version != PROTOCOL_VERSION {
        return Err(ErrorKind::InvalidProtocol(version).into());
    }

    let body_length = buf.load_u32()?;
    let serial = buf.load_u32()?;
    let fields_length = buf.load_u32()?;

    let header = Header {
        endianness,
        message_type,
        flags,
        body_length,
        serial,
    };

    Ok(Some((header, fields_length)))
}

/// Try to read one complete message from the start of `data`.
///
/// Returns `Ok(None)` without consuming anything if `data` does not yet
/// contain the whole message, otherwise the message and the number of bytes
/// it occupied.
///
/// A message of an unknown type fails with
/// [`ErrorKind::InvalidMessageType`]. [`MessageCodec`](super::MessageCodec)
/// skips such messages instead.
///
/// # Examples
///
/// ```
/// use dbus_peer::message::{read_message, write_message};
/// use dbus_peer::proto::Endianness;
/// use dbus_peer::{Message, ObjectPath};
/// use std::num::NonZeroU32;
///
/// let serial = NonZeroU32::new(1).unwrap();
/// let m = Message::method_call(ObjectPath::new("/")?, "Ping").with_serial(serial);
///
/// let mut bytes = Vec::new();
/// write_message(&m, Endianness::LITTLE, &mut bytes)?;
///
/// assert!(read_message(&bytes[..10])?.is_none());
///
/// let (m2, n) = read_message(&bytes)?.unwrap();
/// assert_eq!(m2, m);
/// assert_eq!(n, bytes.len());
/// # Ok::<_, dbus_peer::Error>(())
/// ```
pub fn read_message(data: &[u8]) -> Result<Option<(Message, usize)>> {
    match read_frame(data)? {
        Some((Frame::Message(message), n)) => Ok(Some((message, n))),
        Some((Frame::Unknown(message_type), _)) => {
            Err(ErrorKind::InvalidMessageType(message_type.get()).into())
        }
        None => Ok(None),
    }
}

/// A complete frame read from a stream.
pub(crate) enum Frame {
    Message(Message),
    /// A message of an unknown type, which is framed but not decoded.
    Unknown(MessageType),
}

/// Read one complete frame from the start of `data`.
pub(crate) fn read_frame(data: &[u8]) -> Result<Option<(Frame, usize)>> {
    let Some((header, fields_length)) = read_header(data)? else {
        return Ok(None);
    };

    if header.body_length > MAX_BODY_LENGTH {
        return Err(ErrorKind::BodyTooLong(header.body_length).into());
    }

    if fields_length > MAX_ARRAY_LENGTH {
        return Err(ErrorKind::ArrayTooLong(fields_length).into());
    }

    let fields_end = FIXED_HEADER_LENGTH + fields_length as usize;
    let body_start = fields_end + padding_to(fields_end, 8);
    let total = body_start + header.body_length as usize;

    if total > MAX_MESSAGE_LENGTH {
        return Err(ErrorKind::MessageTooLong(total).into());
    }

    if data.len() < total {
        return Ok(None);
    }

    if !header.message_type.is_known() {
        return Ok(Some((Frame::Unknown(header.message_type), total)));
    }

    let serial = NonZeroU32::new(header.serial).ok_or(ErrorKind::ZeroSerial)?;

    let mut fields = ReadBuf::with_position(&data[..fields_end], 12, header.endianness);
    let fields = fields.load(&header_fields_type())?;
    let headers = Headers::from_fields(&fields)?;

    let kind = headers.kind(header.message_type)?;

    let mut body = ReadBuf::with_position(&data[..total], body_start, header.endianness);

    let values = match body.load_body(&headers.signature) {
        Ok(values) => values,
        Err(error) if error.is_buffer_underrun() => {
            return Err(body_length_mismatch(header.body_length, &body, body_start));
        }
        Err(error) => return Err(error),
    };

    if !body.is_empty() {
        return Err(body_length_mismatch(header.body_length, &body, body_start));
    }

    let message = Message {
        kind,
        serial: Some(serial),
        flags: header.flags,
        interface: headers.interface,
        destination: headers.destination,
        sender: headers.sender,
        signature: headers.signature,
        body: values,
    };

    Ok(Some((Frame::Message(message), total)))
}

fn body_length_mismatch(declared: u32, body: &ReadBuf<'_>, body_start: usize) -> Error {
    Error::new(ErrorKind::BodyLengthMismatch {
        declared,
        consumed: body.position() - body_start,
    })
}

/// Header fields collected from the `a(yv)` array.
#[derive(Default)]
struct Headers {
    path: Option<ObjectPath>,
    interface: Option<Box<str>>,
    member: Option<Box<str>>,
    error_name: Option<Box<str>>,
    reply_serial: Option<u32>,
    destination: Option<Box<str>>,
    sender: Option<Box<str>>,
    signature: Signature,
}

impl Headers {
    fn from_fields(fields: &Value) -> Result<Self> {
        let mut headers = Headers::default();

        for field in fields.as_array().unwrap_or_default() {
            let Value::Struct(field) = field else {
                continue;
            };

            let [Value::Byte(code), Value::Variant(value)] = &field[..] else {
                continue;
            };

            let code = HeaderField::new(*code);
            let value = &**value;

            match (code, value) {
                (HeaderField::PATH, Value::ObjectPath(path)) => {
                    headers.path = Some(path.clone());
                }
                (HeaderField::INTERFACE, Value::String(string)) => {
                    headers.interface = Some(string.as_str().into());
                }
                (HeaderField::MEMBER, Value::String(string)) => {
                    headers.member = Some(string.as_str().into());
                }
                (HeaderField::ERROR_NAME, Value::String(string)) => {
                    headers.error_name = Some(string.as_str().into());
                }
                (HeaderField::REPLY_SERIAL, Value::UInt32(serial)) => {
                    headers.reply_serial = Some(*serial);
                }
                (HeaderField::DESTINATION, Value::String(string)) => {
                    headers.destination = Some(string.as_str().into());
                }
                (HeaderField::SENDER, Value::String(string)) => {
                    headers.sender = Some(string.as_str().into());
                }
                (HeaderField::SIGNATURE, Value::Signature(signature)) => {
                    headers.signature = signature.clone();
                }
                (HeaderField::UNIX_FDS, Value::UInt32(..)) => {}
                (code, _) if code.is_known() => {
                    return Err(ErrorKind::InvalidHeaderField(code.get()).into());
                }
                // Unknown header fields must be ignored.
                _ => {}
            }
        }

        Ok(headers)
    }

    fn kind(&self, message_type: MessageType) -> Result<MessageKind> {
        let kind = match message_type {
            MessageType::METHOD_CALL => MessageKind::MethodCall {
                path: self.path.clone().ok_or(ErrorKind::MissingHeader("PATH"))?,
                member: self.member.clone().ok_or(ErrorKind::MissingHeader("MEMBER"))?,
            },
            MessageType::METHOD_RETURN => MessageKind::MethodReturn {
                reply_serial: self.reply_serial()?,
            },
            MessageType::ERROR => MessageKind::Error {
                error_name: self
                    .error_name
                    .clone()
                    .ok_or(ErrorKind::MissingHeader("ERROR_NAME"))?,
                reply_serial: self.reply_serial()?,
            },
            MessageType::SIGNAL => {
                if self.interface.is_none() {
                    return Err(ErrorKind::MissingHeader("INTERFACE").into());
                }

                MessageKind::Signal {
                    path: self.path.clone().ok_or(ErrorKind::MissingHeader("PATH"))?,
                    member: self.member.clone().ok_or(ErrorKind::MissingHeader("MEMBER"))?,
                }
            }
            message_type => return Err(ErrorKind::InvalidMessageType(message_type.get()).into()),
        };

        Ok(kind)
    }

    fn reply_serial(&self) -> Result<NonZeroU32> {
        let serial = self
            .reply_serial
            .ok_or(ErrorKind::MissingHeader("REPLY_SERIAL"))?;
        Ok(NonZeroU32::new(serial).ok_or(ErrorKind::ZeroSerial)?)
    }
}

/// Write `message` to the end of `out` using the given endianness.
///
/// # Errors
///
/// Errors with [`ErrorKind::ZeroSerial`] if the message has not been
/// assigned a serial, or if the body exceeds protocol limits.
pub fn write_message(message: &Message, endianness: Endianness, out: &mut Vec<u8>) -> Result<()> {
    let Some(serial) = message.serial else {
        return Err(ErrorKind::ZeroSerial.into());
    };

    let mut buf = WriteBuf::with_endianness(endianness);

    buf.store_u8(endianness.get());
    buf.store_u8(message.message_type().get());
    buf.store_u8(message.flags.bits());
    buf.store_u8(PROTOCOL_VERSION);
    // NB: Patched once the body has been written.
    buf.store_u32(0);
    buf.store_u32(serial.get());

    let fields = header_fields(message)?;
    buf.store(&fields, &header_fields_type())?;
    buf.align(8);

    let body_start = buf.len();
    buf.store_body(&message.body, &message.signature)?;

    let body_length = match u32::try_from(buf.len() - body_start) {
        Ok(length) if length <= MAX_BODY_LENGTH => length,
        _ => return Err(ErrorKind::BodyTooLong(u32::MAX).into()),
    };

    if buf.len() > MAX_MESSAGE_LENGTH {
        return Err(ErrorKind::MessageTooLong(buf.len()).into());
    }

    buf.patch_u32(4, body_length);
    out.extend_from_slice(buf.get());
    Ok(())
}

fn header_fields(message: &Message) -> Result<Value> {
    let mut fields = Vec::new();

    let mut push = |code: HeaderField, value: Value| {
        fields.push(Value::Struct(vec![
            Value::Byte(code.get()),
            Value::variant(value),
        ]));
    };

    match &message.kind {
        MessageKind::MethodCall { path, member } | MessageKind::Signal { path, member } => {
            push(HeaderField::PATH, Value::ObjectPath(path.clone()));
            push(HeaderField::MEMBER, Value::from(&**member));
        }
        MessageKind::MethodReturn { reply_serial } => {
            push(HeaderField::REPLY_SERIAL, Value::from(reply_serial.get()));
        }
        MessageKind::Error {
            error_name,
            reply_serial,
        } => {
            push(HeaderField::ERROR_NAME, Value::from(&**error_name));
            push(HeaderField::REPLY_SERIAL, Value::from(reply_serial.get()));
        }
    }

    if let Some(interface) = &message.interface {
        push(HeaderField::INTERFACE, Value::from(&**interface));
    }

    if let Some(destination) = &message.destination {
        push(HeaderField::DESTINATION, Value::from(&**destination));
    }

    if let Some(sender) = &message.sender {
        push(HeaderField::SENDER, Value::from(&**sender));
    }

    if !message.signature.is_empty() {
        push(
            HeaderField::SIGNATURE,
            Value::Signature(message.signature.clone()),
        );
    }

    Value::array(header_field_type(), fields)
}
