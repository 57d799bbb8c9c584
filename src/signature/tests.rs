use super::{parse, Signature, SignatureErrorKind, Type, MAX_SIGNATURE};

use SignatureErrorKind::*;

macro_rules! test {
    ($input:expr, $expected:pat) => {{
        let input: &[u8] = $input;
        let input = std::str::from_utf8(input).expect("test input is utf-8");
        let actual = parse(input).map_err(|e| e.kind().clone());

        assert!(
            matches!(actual, $expected),
            "{actual:?} does not match {}",
            stringify!($expected)
        );
    }};
}

#[test]
fn signature_tests() {
    test!(b"", Ok(..));
    test!(b"sss", Ok(..));
    test!(b"i", Ok(..));
    test!(b"b", Ok(..));
    test!(b"ai", Ok(..));
    test!(b"(i)", Ok(..));
    test!(b"a{sv}", Ok(..));
    test!(b"w", Err(UnknownTypeCode(b'w')));
    test!(b"r", Err(UnknownTypeCode(b'r')));
    test!(b"a", Err(MissingArrayElementType));
    test!(b"aaaaaa", Err(MissingArrayElementType));
    test!(b"ii(ii)a", Err(MissingArrayElementType));
    test!(b"ia", Err(MissingArrayElementType));
    test!(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaai", Ok(..));
    test!(
        b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaai",
        Err(ExceededMaximumArrayRecursion)
    );
    test!(b")", Err(StructEndedButNotStarted));
    test!(b"}", Err(DictEndedButNotStarted));
    test!(b"i)", Err(StructEndedButNotStarted));
    test!(b"a)", Err(MissingArrayElementType));
    test!(b"(", Err(StructStartedButNotEnded));
    test!(b"(i", Err(StructStartedButNotEnded));
    test!(b"(iiiii", Err(StructStartedButNotEnded));
    test!(b"(ai", Err(StructStartedButNotEnded));
    test!(b"a{s", Err(DictStartedButNotEnded));
    test!(b"()", Err(StructHasNoFields));
    test!(b"(())", Err(StructHasNoFields));
    test!(b"a()", Err(StructHasNoFields));
    test!(b"i()", Err(StructHasNoFields));
    test!(b"()i", Err(StructHasNoFields));
    test!(b"(a)", Err(MissingArrayElementType));
    test!(b"a{ia}", Err(MissingArrayElementType));
    test!(b"a{}", Err(DictEntryHasNoFields));
    test!(b"a{aii}", Err(DictKeyMustBeBasicType));
    test!(b"a{vi}", Err(DictKeyMustBeBasicType));
    test!(b" ", Err(UnknownTypeCode(..)));
    test!(b"not a valid signature", Err(UnknownTypeCode(..)));
    test!(b"123", Err(UnknownTypeCode(..)));
    test!(b".", Err(UnknownTypeCode(..)));
    /* https://bugs.freedesktop.org/show_bug.cgi?id=17803 */
    test!(b"a{(ii)i}", Err(DictKeyMustBeBasicType));
    test!(b"a{i}", Err(DictEntryHasOnlyOneField));
    test!(b"{is}", Err(DictEntryNotInsideArray));
    test!(b"a({is})", Err(DictEntryNotInsideArray));
    test!(b"a{isi}", Err(DictEntryHasTooManyFields));
    test!(&[b'i'; 255], Ok(..));
    test!(&[b'i'; MAX_SIGNATURE + 1], Err(SignatureTooLong));
    test! {
        b"((((((((((((((((((((((((((((((((ii))))))))))))))))))))))))))))))))",
        Ok(..)
    };
    test! {
        b"(((((((((((((((((((((((((((((((((ii)))))))))))))))))))))))))))))))))",
        Err(ExceededMaximumStructRecursion)
    };
}

#[test]
fn nested_types() -> Result<(), super::SignatureError> {
    let types = parse("aa(as)yua{yy}")?;

    assert_eq!(
        types,
        [
            Type::Array(Box::new(Type::Array(Box::new(Type::Struct(vec![
                Type::Array(Box::new(Type::String))
            ]))))),
            Type::Byte,
            Type::UInt32,
            Type::dict(Type::Byte, Type::Byte),
        ]
    );

    Ok(())
}

#[test]
fn display_round_trips_text() -> Result<(), super::SignatureError> {
    for text in ["", "y", "a{sv}", "(ia(yy)v)", "aa{oa{sv}}"] {
        let signature = Signature::new(text)?;
        let rebuilt = Signature::from_types(signature.types().iter().cloned())?;
        assert_eq!(rebuilt, signature);
    }

    Ok(())
}

#[test]
fn alignments() {
    assert_eq!(Type::Byte.alignment(), 1);
    assert_eq!(Type::Variant.alignment(), 1);
    assert_eq!(Type::Signature.alignment(), 1);
    assert_eq!(Type::Int16.alignment(), 2);
    assert_eq!(Type::Boolean.alignment(), 4);
    assert_eq!(Type::String.alignment(), 4);
    assert_eq!(Type::Array(Box::new(Type::Int64)).alignment(), 4);
    assert_eq!(Type::Double.alignment(), 8);
    assert_eq!(Type::Struct(vec![Type::Byte]).alignment(), 8);
}
