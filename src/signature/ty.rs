use std::fmt;

/// A single complete type parsed from a signature.
///
/// A [`Type::DictEntry`] only ever occurs as the element of a
/// [`Type::Array`], and its key is always a basic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// 8-bit unsigned integer (`y`).
    Byte,
    /// Boolean value (`b`), encoded as a 32-bit integer which is 0 or 1.
    Boolean,
    /// 16-bit signed integer (`n`).
    Int16,
    /// 16-bit unsigned integer (`q`).
    UInt16,
    /// 32-bit signed integer (`i`).
    Int32,
    /// 32-bit unsigned integer (`u`).
    UInt32,
    /// 64-bit signed integer (`x`).
    Int64,
    /// 64-bit unsigned integer (`t`).
    UInt64,
    /// IEEE 754 double (`d`).
    Double,
    /// UTF-8 string (`s`).
    String,
    /// Name of an object instance (`o`).
    ObjectPath,
    /// A type signature (`g`).
    Signature,
    /// Index of an out-of-band unix file descriptor (`h`).
    UnixFd,
    /// A value which carries its own signature (`v`).
    Variant,
    /// An array of the given element type (`a`).
    Array(Box<Type>),
    /// A struct with ordered fields (`(...)`).
    Struct(Vec<Type>),
    /// A key-value entry in a dict (`{kv}`).
    DictEntry(Box<Type>, Box<Type>),
}

impl Type {
    /// The alignment in bytes which values of this type are padded to,
    /// relative to the start of the message.
    pub fn alignment(&self) -> usize {
        match self {
            Type::Byte | Type::Signature | Type::Variant => 1,
            Type::Int16 | Type::UInt16 => 2,
            Type::Boolean
            | Type::Int32
            | Type::UInt32
            | Type::String
            | Type::ObjectPath
            | Type::UnixFd
            | Type::Array(..) => 4,
            Type::Int64
            | Type::UInt64
            | Type::Double
            | Type::Struct(..)
            | Type::DictEntry(..) => 8,
        }
    }

    /// Test if the type is a basic type, which can be used as a dict key.
    pub fn is_basic(&self) -> bool {
        !matches!(
            self,
            Type::Variant | Type::Array(..) | Type::Struct(..) | Type::DictEntry(..)
        )
    }

    /// Construct the `a{kv}` type.
    pub fn dict(key: Type, value: Type) -> Type {
        Type::Array(Box::new(Type::DictEntry(Box::new(key), Box::new(value))))
    }

    /// The type code of a non-container type.
    pub(crate) fn code(&self) -> Option<u8> {
        Some(match self {
            Type::Byte => b'y',
            Type::Boolean => b'b',
            Type::Int16 => b'n',
            Type::UInt16 => b'q',
            Type::Int32 => b'i',
            Type::UInt32 => b'u',
            Type::Int64 => b'x',
            Type::UInt64 => b't',
            Type::Double => b'd',
            Type::String => b's',
            Type::ObjectPath => b'o',
            Type::Signature => b'g',
            Type::UnixFd => b'h',
            Type::Variant => b'v',
            _ => return None,
        })
    }

    /// Write the signature of the type to the given string.
    pub(crate) fn write_to(&self, out: &mut String) {
        if let Some(code) = self.code() {
            out.push(char::from(code));
            return;
        }

        match self {
            Type::Array(element) => {
                out.push('a');
                element.write_to(out);
            }
            Type::Struct(fields) => {
                out.push('(');

                for field in fields {
                    field.write_to(out);
                }

                out.push(')');
            }
            Type::DictEntry(key, value) => {
                out.push('{');
                key.write_to(out);
                value.write_to(out);
                out.push('}');
            }
            _ => {}
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_to(&mut out);
        f.write_str(&out)
    }
}
