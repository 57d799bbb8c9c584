use crate::buf::{decode, encode, ReadBuf, WriteBuf};
use crate::error::{ErrorKind, Result};
use crate::proto::Endianness;
use crate::signature::{Signature, Type};
use crate::{ObjectPath, Value};

fn round_trip(signature: &str, body: &[Value], endianness: Endianness) -> Result<Vec<u8>> {
    let signature = Signature::new(signature)?;

    let mut buf = WriteBuf::with_endianness(endianness);
    buf.store_body(body, &signature)?;

    let mut read = ReadBuf::new(buf.get(), endianness);
    let decoded = read.load_body(&signature)?;
    assert_eq!(decoded, body);
    assert!(read.is_empty());
    Ok(buf.into_inner())
}

#[test]
fn string_body() -> Result<()> {
    let bytes = round_trip("s", &[Value::from("hello")], Endianness::LITTLE)?;
    assert_eq!(bytes, b"\x05\0\0\0hello\0");
    Ok(())
}

#[test]
fn string_dict_body() -> Result<()> {
    let dict = Value::dict(
        Type::String,
        Type::String,
        [(Value::from("k"), Value::from("v"))],
    )?;

    let bytes = round_trip("a{ss}", &[dict.clone()], Endianness::BIG)?;

    #[rustfmt::skip]
    let expected: &[u8] = &[
        // array length, excluding the padding to the first entry
        0, 0, 0, 14,
        // pad to 8
        0, 0, 0, 0,
        // key
        0, 0, 0, 1, b'k', 0,
        // pad to 4
        0, 0,
        // value
        0, 0, 0, 1, b'v', 0,
    ];

    assert_eq!(bytes, expected);

    let mut read = ReadBuf::new(&bytes, Endianness::BIG);
    let decoded = read.load_body(&Signature::new("a{ss}")?)?;

    let pairs = decoded[0]
        .dict_entries()
        .map(|it| it.map(|(k, v)| (k.as_str(), v.as_str())).collect::<Vec<_>>());

    assert_eq!(pairs, Some(vec![(Some("k"), Some("v"))]));
    Ok(())
}

#[test]
fn scalars_are_aligned() -> Result<()> {
    let body = [
        Value::from(1u8),
        Value::from(2u16),
        Value::from(3u32),
        Value::from(4u64),
        Value::from(true),
        Value::from(-1i16),
        Value::from(1.5f64),
    ];

    let bytes = round_trip("yqutbnd", &body, Endianness::LITTLE)?;

    #[rustfmt::skip]
    let expected: &[u8] = &[
        1, 0, 2, 0, 3, 0, 0, 0,
        4, 0, 0, 0, 0, 0, 0, 0,
        1, 0, 0, 0, 0xff, 0xff, 0, 0,
        0, 0, 0, 0, 0, 0, 0xf8, 0x3f,
    ];

    assert_eq!(bytes, expected);
    Ok(())
}

#[test]
fn alignment_is_relative_to_offset() -> Result<()> {
    let mut buf = WriteBuf::with_endianness(Endianness::LITTLE);
    buf.store_u8(0xff);
    encode(&Value::from(7u64), &Type::UInt64, &mut buf)?;
    assert_eq!(buf.len(), 16);

    let (value, offset) = decode(buf.get(), 1, &Type::UInt64, Endianness::LITTLE)?;
    assert_eq!(value, Value::UInt64(7));
    assert_eq!(offset, 16);
    Ok(())
}

#[test]
fn empty_array_is_padded_to_element() -> Result<()> {
    let array = Value::Array(crate::Array::empty(Type::UInt64));
    let bytes = round_trip("at", &[array], Endianness::LITTLE)?;
    assert_eq!(bytes, [0, 0, 0, 0, 0, 0, 0, 0]);
    Ok(())
}

#[test]
fn variants() -> Result<()> {
    let path = ObjectPath::new("/org/example")?;

    let body = [
        Value::variant(42u32),
        Value::variant(Value::Struct(vec![Value::from("a"), Value::from(path)])),
        Value::variant(Value::variant(1u8)),
    ];

    let bytes = round_trip("vvv", &body, Endianness::BIG)?;
    assert_eq!(&bytes[..8], b"\x01u\0\0\0\0\0\x2a");
    Ok(())
}

#[test]
fn nested_containers() -> Result<()> {
    let inner = Value::array(Type::Int32, [Value::from(1i32), Value::from(2i32)])?;
    let outer = Value::array(Type::Array(Box::new(Type::Int32)), [inner.clone(), inner])?;

    let properties = Value::dict(
        Type::String,
        Type::Variant,
        [
            (Value::from("Name"), Value::variant("x")),
            (Value::from("Count"), Value::variant(3i64)),
        ],
    )?;

    round_trip("aaia{sv}", &[outer, properties], Endianness::LITTLE)?;
    Ok(())
}

#[test]
fn mismatched_values() -> Result<()> {
    let mut buf = WriteBuf::new();
    let error = buf
        .store_body(&[Value::from(1u32)], &Signature::new("s")?)
        .unwrap_err();

    assert!(matches!(error.kind(), ErrorKind::ValueMismatch { expected } if expected == "s"));

    let error = buf.store_body(&[], &Signature::new("s")?).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ValueMismatch { .. }));
    Ok(())
}

#[test]
fn buffer_underrun() {
    let data = [5, 0, 0, 0, b'h', b'e'];
    let error = decode(&data, 0, &Type::String, Endianness::LITTLE).unwrap_err();

    assert!(error.is_buffer_underrun());
    assert!(matches!(
        error.kind(),
        ErrorKind::BufferUnderrun {
            needed: 5,
            available: 2
        }
    ));
}

#[test]
fn invalid_strings() {
    let data = [2, 0, 0, 0, b'h', b'i', b'!'];
    let error = decode(&data, 0, &Type::String, Endianness::LITTLE).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::NotNulTerminated));

    let data = [2, 0, 0, 0, 0xc3, 0x28, 0];
    let error = decode(&data, 0, &Type::String, Endianness::LITTLE).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidUtf8(..)));

    let data = [4, 0, 0, 0, b'a', b'/', b'b', b'/', 0];
    let error = decode(&data, 0, &Type::ObjectPath, Endianness::LITTLE).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ObjectPath(..)));
}

#[test]
fn invalid_boolean() {
    let data = [2, 0, 0, 0];
    let error = decode(&data, 0, &Type::Boolean, Endianness::LITTLE).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidBoolean(2)));
}

#[test]
fn array_length_mismatch() {
    // Declares 6 bytes of `u` elements, which can only consume 4 or 8.
    let data = [6, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0];
    let ty = Type::Array(Box::new(Type::UInt32));
    let error = decode(&data, 0, &ty, Endianness::LITTLE).unwrap_err();

    assert!(matches!(
        error.kind(),
        ErrorKind::ArrayLengthMismatch {
            declared: 6,
            consumed: 8
        }
    ));
}

#[test]
fn array_too_long() {
    let data = [0, 0, 0, 0x10];
    let ty = Type::Array(Box::new(Type::Byte));
    let error = decode(&data, 0, &ty, Endianness::LITTLE).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::ArrayTooLong(..)));
}

#[test]
fn variant_with_bad_signature() {
    let data = [2, b'u', b'u', 0, 0, 0, 0, 0];
    let error = decode(&data, 0, &Type::Variant, Endianness::LITTLE).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Signature(..)));

    let data = [1, b'!', 0];
    let error = decode(&data, 0, &Type::Variant, Endianness::LITTLE).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::Signature(..)));
}

#[test]
fn deeply_nested_variants() {
    let mut data = Vec::new();

    for _ in 0..100 {
        data.extend_from_slice(&[1, b'v', 0]);
    }

    data.extend_from_slice(&[1, b'y', 0, 42]);

    let error = decode(&data, 0, &Type::Variant, Endianness::LITTLE).unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::NestingTooDeep));
}
