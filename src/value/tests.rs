use crate::signature::{Signature, Type};
use crate::{ObjectPath, Value};

#[test]
fn types_of_values() -> crate::Result<()> {
    let path = ObjectPath::new("/a/b")?;

    let value = Value::Struct(vec![
        Value::from(1u8),
        Value::from("s"),
        Value::from(path),
        Value::variant(42i64),
        Value::array(Type::Int32, [Value::from(1i32), Value::from(2i32)])?,
    ]);

    assert_eq!(value.ty().to_string(), "(ysovai)");
    assert!(value.conforms_to(&Signature::new("(ysovai)")?.types()[0]));
    assert!(!value.conforms_to(&Signature::new("(ysovau)")?.types()[0]));
    Ok(())
}

#[test]
fn empty_array_keeps_element_type() {
    let value = Value::Array(crate::Array::empty(Type::dict(Type::String, Type::Variant)));
    assert_eq!(value.ty().to_string(), "aa{sv}");
}

#[test]
fn mismatched_array_element() {
    assert!(Value::array(Type::String, [Value::from(1u32)]).is_err());
    assert!(Value::dict(Type::Variant, Type::String, Vec::new()).is_err());
}

#[test]
fn dict_entries() -> crate::Result<()> {
    let dict = Value::dict(
        Type::String,
        Type::UInt32,
        [
            (Value::from("a"), Value::from(1u32)),
            (Value::from("b"), Value::from(2u32)),
        ],
    )?;

    let entries = dict
        .dict_entries()
        .map(|it| {
            it.map(|(k, v)| (k.as_str().map(str::to_owned), v.as_u32()))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    assert_eq!(
        entries,
        [
            (Some("a".to_owned()), Some(1)),
            (Some("b".to_owned()), Some(2))
        ]
    );

    assert!(Value::from("x").dict_entries().is_none());
    Ok(())
}
