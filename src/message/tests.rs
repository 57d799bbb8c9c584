use std::num::NonZeroU32;

use bytes::BytesMut;
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ErrorKind, Result};
use crate::message::{read_message, write_message, MessageCodec};
use crate::proto::{Endianness, Flags};
use crate::signature::{Signature, Type};
use crate::{Message, MessageKind, ObjectPath, Value};

#[rustfmt::skip]
const LE_BLOB: [u8; 36] = [
    // byte 0
    // yyyyuu fixed headers
    b'l',
    // reply (which is the simplest message)
    b'\x02',
    // no auto-starting
    b'\x02',
    // D-Bus version = 1
    b'\x01',
    // byte 4
    // bytes in body = 4
    b'\x04', b'\x00', b'\x00', b'\x00',
    // byte 8
    // serial number = 0x12345678
    b'\x78', b'\x56', b'\x34', b'\x12',
    // byte 12
    // a(yv) variable headers start here
    // bytes in array of variable headers = 15
    // pad to 8-byte boundary = nothing
    b'\x0f', b'\0', b'\0', b'\0',
    // byte 16
    // in reply to:
    b'\x05',
    // variant signature = u
    // pad to 4-byte boundary = nothing
    b'\x01', b'u', b'\0',
    // 0xabcdef12
    // pad to 8-byte boundary = nothing
    b'\x12', b'\xef', b'\xcd', b'\xab',
    // byte 24
    // signature:
    b'\x08',
    // variant signature = g
    b'\x01', b'g', b'\0',
    // 1 byte, u, NUL (no alignment needed)
    b'\x01', b'u', b'\0',
    // pad to 8-byte boundary for body
    b'\0',
    // body; byte 32
    // 0xdeadbeef
    b'\xef', b'\xbe', b'\xad', b'\xde'
];

#[rustfmt::skip]
const BE_BLOB: [u8; 36] = [
    // byte 0
    // yyyyuu fixed headers
    b'B',
    // reply (which is the simplest message)
    b'\x02',
    // no auto-starting
    b'\x02',
    // D-Bus version = 1
    b'\x01',
    // byte 4
    // bytes in body = 4
    b'\x00', b'\x00', b'\x00', b'\x04',
    // byte 8
    // serial number = 0x12345678
    b'\x12', b'\x34', b'\x56', b'\x78',
    // byte 12
    // a(yv) variable headers start here
    // bytes in array of variable headers = 15
    // pad to 8-byte boundary = nothing
    b'\0', b'\0', b'\0', b'\x0f',
    // byte 16
    // in reply to:
    b'\x05',
    // variant signature = u
    // pad to 4-byte boundary = nothing
    b'\x01', b'u', b'\0',
    // 0xabcdef12
    // pad to 8-byte boundary = nothing
    b'\xab', b'\xcd', b'\xef', b'\x12',
    // byte 24
    // signature:
    b'\x08',
    // variant signature = g
    b'\x01', b'g', b'\0',
    // 1 byte, u, NUL (no alignment needed)
    b'\x01', b'u', b'\0',
    // pad to 8-byte boundary for body
    b'\0',
    // body; byte 32
    // 0xdeadbeef
    b'\xde', b'\xad', b'\xbe', b'\xef',
];

fn serial(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

fn blob_message() -> Result<Message> {
    Message::method_return(serial(0xabcdef12))
        .with_serial(serial(0x12345678))
        .with_flags(Flags::NO_AUTO_START)
        .with_body(Signature::new("u")?, vec![Value::from(0xdeadbeefu32)])
}

fn sample_call() -> Result<Message> {
    let body = vec![
        Value::from("hello"),
        Value::dict(
            Type::String,
            Type::Variant,
            [(Value::from("Answer"), Value::variant(42u32))],
        )?,
    ];

    Message::method_call(ObjectPath::new("/org/example/Object")?, "Frobnicate")
        .with_serial(serial(7))
        .with_interface("org.example.Frob")
        .with_destination(":1.42")
        .with_sender(":1.7")
        .with_values(body)
}

#[test]
fn write_blobs() -> Result<()> {
    let message = blob_message()?;

    let mut out = Vec::new();
    write_message(&message, Endianness::LITTLE, &mut out)?;
    assert_eq!(out, LE_BLOB);

    let mut out = Vec::new();
    write_message(&message, Endianness::BIG, &mut out)?;
    assert_eq!(out, BE_BLOB);
    Ok(())
}

#[test]
fn read_blobs() -> Result<()> {
    let expected = blob_message()?;

    for blob in [&LE_BLOB, &BE_BLOB] {
        let (message, n) = read_message(blob)?.expect("complete message");
        assert_eq!(n, blob.len());
        assert_eq!(message, expected);
        assert_eq!(message.reply_serial(), Some(serial(0xabcdef12)));
        assert!(message.flags() & Flags::NO_AUTO_START);
    }

    Ok(())
}

#[test]
fn need_more_bytes() -> Result<()> {
    for n in 0..LE_BLOB.len() {
        assert!(read_message(&LE_BLOB[..n])?.is_none(), "{n} bytes");
    }

    Ok(())
}

#[test]
fn trailing_bytes_are_left() -> Result<()> {
    let mut data = LE_BLOB.to_vec();
    data.extend_from_slice(&BE_BLOB);

    let (_, n) = read_message(&data)?.expect("complete message");
    assert_eq!(n, LE_BLOB.len());

    let (_, m) = read_message(&data[n..])?.expect("complete message");
    assert_eq!(m, BE_BLOB.len());
    Ok(())
}

#[test]
fn message_round_trip() -> Result<()> {
    let message = sample_call()?;

    for endianness in [Endianness::LITTLE, Endianness::BIG] {
        let mut out = Vec::new();
        write_message(&message, endianness, &mut out)?;

        let (decoded, n) = read_message(&out)?.expect("complete message");
        assert_eq!(n, out.len());
        assert_eq!(decoded, message);
        assert_eq!(decoded.interface(), Some("org.example.Frob"));
        assert_eq!(decoded.member(), Some("Frobnicate"));
        assert_eq!(decoded.signature(), "sa{sv}");
    }

    Ok(())
}

#[test]
fn signal_round_trip() -> Result<()> {
    let message = Message::signal(ObjectPath::new("/a")?, "org.example.A", "Changed")
        .with_serial(serial(3))
        .with_values(vec![Value::from(true)])?;

    let mut out = Vec::new();
    write_message(&message, Endianness::NATIVE, &mut out)?;

    let (decoded, _) = read_message(&out)?.expect("complete message");
    assert!(matches!(decoded.kind(), MessageKind::Signal { member, .. } if &**member == "Changed"));
    assert_eq!(decoded.path().map(ObjectPath::as_str), Some("/a"));
    Ok(())
}

#[test]
fn unassigned_serial() -> Result<()> {
    let message = Message::method_call(ObjectPath::root(), "Ping");
    let error = write_message(&message, Endianness::LITTLE, &mut Vec::new()).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ZeroSerial));
    Ok(())
}

#[test]
fn invalid_fixed_header() {
    let mut data = LE_BLOB;
    data[0] = b'x';
    let error = read_message(&data).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidEndianness(b'x')));

    let mut data = LE_BLOB;
    data[3] = 2;
    let error = read_message(&data).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidProtocol(2)));

    let mut data = LE_BLOB;
    data[8..12].copy_from_slice(&[0, 0, 0, 0]);
    let error = read_message(&data).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ZeroSerial));

    let mut data = LE_BLOB;
    data[1] = 9;
    let error = read_message(&data).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidMessageType(9)));

    let mut data = LE_BLOB;
    data[4..8].copy_from_slice(&(1u32 << 28).to_le_bytes());
    let error = read_message(&data).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::BodyTooLong(..)));
}

#[test]
fn missing_required_header() {
    // A method call with the blob's headers lacks both PATH and MEMBER.
    let mut data = LE_BLOB;
    data[1] = 1;
    let error = read_message(&data).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::MissingHeader("PATH")));
}

#[test]
fn body_length_mismatch() {
    // Declare 8 bytes of body for a `u` signature and supply them.
    let mut data = LE_BLOB.to_vec();
    data[4] = 8;
    data.extend_from_slice(&[0, 0, 0, 0]);

    let error = read_message(&data).unwrap_err();

    assert!(matches!(
        error.kind(),
        ErrorKind::BodyLengthMismatch {
            declared: 8,
            consumed: 4
        }
    ));

    // Declare 2 bytes of body, which is too short for the signature.
    let mut data = LE_BLOB[..34].to_vec();
    data[4] = 2;

    let error = read_message(&data).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::BodyLengthMismatch { declared: 2, .. }
    ));
}

#[test]
fn wrongly_typed_header_field() {
    // Replace the `u` type of the reply serial with `i`.
    let mut data = LE_BLOB;
    data[18] = b'i';
    let error = read_message(&data).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidHeaderField(5)));
}

#[test]
fn unknown_header_field_is_ignored() -> Result<()> {
    // Turn the signature field into an unknown field and drop the body.
    let mut data = LE_BLOB[..32].to_vec();
    data[4] = 0;
    data[24] = 0x2a;

    let (message, n) = read_message(&data)?.expect("complete message");
    assert_eq!(n, 32);
    assert!(message.signature().is_empty());
    assert!(message.body().is_empty());
    Ok(())
}

#[test]
fn codec_frames_stream() -> Result<()> {
    let mut codec = MessageCodec::with_endianness(Endianness::BIG);
    let mut buf = BytesMut::new();

    codec.encode(blob_message()?, &mut buf)?;
    codec.encode(sample_call()?, &mut buf)?;
    assert_eq!(&buf[..36], &BE_BLOB[..]);

    let mut partial = buf.split_to(20);
    assert!(codec.decode(&mut partial)?.is_none());
    partial.unsplit(buf);

    assert_eq!(codec.decode(&mut partial)?, Some(blob_message()?));
    assert_eq!(codec.decode(&mut partial)?, Some(sample_call()?));
    assert_eq!(codec.decode(&mut partial)?, None);
    assert!(partial.is_empty());
    Ok(())
}

#[test]
fn codec_skips_unknown_message_types() -> Result<()> {
    let mut codec = MessageCodec::new();
    let mut buf = BytesMut::new();

    codec.encode(sample_call()?, &mut buf)?;
    buf[1] = 5;
    codec.encode(blob_message()?, &mut buf)?;

    assert_eq!(codec.decode(&mut buf)?, Some(blob_message()?));
    assert!(buf.is_empty());

    // Incomplete unknown messages wait for the rest like any other.
    let mut bytes = BytesMut::new();
    codec.encode(sample_call()?, &mut bytes)?;
    bytes[1] = 0;

    let mut buf = bytes.split_to(bytes.len() - 1);
    assert_eq!(codec.decode(&mut buf)?, None);
    buf.unsplit(bytes);

    assert_eq!(codec.decode(&mut buf)?, None);
    assert!(buf.is_empty());
    Ok(())
}

proptest! {
    #[test]
    fn split_at_any_boundary(at in 0usize..1000, big in any::<bool>()) {
        let message = sample_call().unwrap();
        let endianness = if big { Endianness::BIG } else { Endianness::LITTLE };

        let mut bytes = Vec::new();
        write_message(&message, endianness, &mut bytes).unwrap();
        let at = at % bytes.len();

        let mut codec = MessageCodec::new();
        let mut buf = BytesMut::from(&bytes[..at]);

        prop_assert!(codec.decode(&mut buf).unwrap().is_none());
        prop_assert_eq!(buf.len(), at);

        buf.extend_from_slice(&bytes[at..]);
        let decoded = codec.decode(&mut buf).unwrap();

        prop_assert_eq!(decoded, Some(message));
        prop_assert!(buf.is_empty());
    }
}
