use super::{SignatureError, SignatureErrorKind, Type, MAX_CONTAINER_DEPTH, MAX_SIGNATURE};

use SignatureErrorKind::*;

/// Parse a signature into its sequence of complete types.
///
/// # Examples
///
/// ```
/// use dbus_peer::signature::{parse, Type};
///
/// let types = parse("sa{sv}")?;
///
/// assert_eq!(types, [Type::String, Type::dict(Type::String, Type::Variant)]);
/// # Ok::<_, dbus_peer::signature::SignatureError>(())
/// ```
pub fn parse(signature: &str) -> Result<Vec<Type>, SignatureError> {
    let bytes = signature.as_bytes();

    if bytes.len() > MAX_SIGNATURE {
        return Err(SignatureError::too_long());
    }

    let mut parser = Parser {
        bytes,
        n: 0,
        arrays: 0,
        structs: 0,
    };

    let mut types = Vec::new();

    while let Some(&b) = parser.bytes.get(parser.n) {
        match b {
            b')' => return Err(SignatureError::new(StructEndedButNotStarted)),
            b'}' => return Err(SignatureError::new(DictEndedButNotStarted)),
            _ => types.push(parser.complete_type(false)?),
        }
    }

    Ok(types)
}

/// Parse a signature which must contain exactly one complete type, such as the
/// signature embedded in a variant.
pub(crate) fn parse_single(signature: &str) -> Result<Type, SignatureError> {
    let mut types = parse(signature)?;

    match (types.pop(), types.is_empty()) {
        (Some(ty), true) => Ok(ty),
        _ => Err(SignatureError::new(NotSingleCompleteType)),
    }
}

struct Parser<'a> {
    bytes: &'a [u8],
    n: usize,
    arrays: usize,
    structs: usize,
}

impl Parser<'_> {
    fn complete_type(&mut self, array_element: bool) -> Result<Type, SignatureError> {
        let Some(&b) = self.bytes.get(self.n) else {
            return Err(SignatureError::new(MissingArrayElementType));
        };

        self.n += 1;

        let ty = match b {
            b'y' => Type::Byte,
            b'b' => Type::Boolean,
            b'n' => Type::Int16,
            b'q' => Type::UInt16,
            b'i' => Type::Int32,
            b'u' => Type::UInt32,
            b'x' => Type::Int64,
            b't' => Type::UInt64,
            b'd' => Type::Double,
            b's' => Type::String,
            b'o' => Type::ObjectPath,
            b'g' => Type::Signature,
            b'h' => Type::UnixFd,
            b'v' => Type::Variant,
            b'a' => {
                if self.arrays == MAX_CONTAINER_DEPTH {
                    return Err(SignatureError::new(ExceededMaximumArrayRecursion));
                }

                if matches!(self.bytes.get(self.n), None | Some(b')' | b'}')) {
                    return Err(SignatureError::new(MissingArrayElementType));
                }

                self.arrays += 1;
                let element = self.complete_type(true)?;
                self.arrays -= 1;
                Type::Array(Box::new(element))
            }
            b'(' => {
                if self.structs == MAX_CONTAINER_DEPTH {
                    return Err(SignatureError::new(ExceededMaximumStructRecursion));
                }

                self.structs += 1;
                let fields = self.fields(b')')?;
                self.structs -= 1;

                if fields.is_empty() {
                    return Err(SignatureError::new(StructHasNoFields));
                }

                Type::Struct(fields)
            }
            b'{' => {
                if !array_element {
                    return Err(SignatureError::new(DictEntryNotInsideArray));
                }

                if self.structs == MAX_CONTAINER_DEPTH {
                    return Err(SignatureError::new(ExceededMaximumDictRecursion));
                }

                self.structs += 1;
                let fields = self.fields(b'}')?;
                self.structs -= 1;

                let mut fields = fields.into_iter();

                let (key, value) = match (fields.next(), fields.next(), fields.next()) {
                    (None, ..) => return Err(SignatureError::new(DictEntryHasNoFields)),
                    (Some(..), None, _) => {
                        return Err(SignatureError::new(DictEntryHasOnlyOneField))
                    }
                    (Some(..), Some(..), Some(..)) => {
                        return Err(SignatureError::new(DictEntryHasTooManyFields))
                    }
                    (Some(key), Some(value), None) => (key, value),
                };

                if !key.is_basic() {
                    return Err(SignatureError::new(DictKeyMustBeBasicType));
                }

                Type::DictEntry(Box::new(key), Box::new(value))
            }
            b')' => return Err(SignatureError::new(StructEndedButNotStarted)),
            b'}' => return Err(SignatureError::new(DictEndedButNotStarted)),
            b => return Err(SignatureError::new(UnknownTypeCode(b))),
        };

        Ok(ty)
    }

    /// Parse container fields up until and including the `end` delimiter.
    fn fields(&mut self, end: u8) -> Result<Vec<Type>, SignatureError> {
        let mut fields = Vec::new();

        loop {
            match self.bytes.get(self.n) {
                None if end == b')' => {
                    return Err(SignatureError::new(StructStartedButNotEnded));
                }
                None => return Err(SignatureError::new(DictStartedButNotEnded)),
                Some(&b) if b == end => {
                    self.n += 1;
                    return Ok(fields);
                }
                Some(b')') => return Err(SignatureError::new(StructEndedButNotStarted)),
                Some(b'}') => return Err(SignatureError::new(DictEndedButNotStarted)),
                Some(..) => fields.push(self.complete_type(false)?),
            }
        }
    }
}
