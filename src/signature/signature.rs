use std::fmt;
use std::str::FromStr;

use super::{parse, SignatureError, Type, MAX_SIGNATURE};

/// A validated D-Bus signature, together with the types it describes.
///
/// # Examples
///
/// ```
/// use dbus_peer::signature::{Signature, Type};
///
/// let signature = Signature::new("a{ss}")?;
///
/// assert_eq!(signature, "a{ss}");
/// assert_eq!(signature.types(), &[Type::dict(Type::String, Type::String)]);
///
/// assert!(Signature::new("a{ss").is_err());
/// # Ok::<_, dbus_peer::signature::SignatureError>(())
/// ```
#[derive(Default, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    string: String,
    types: Vec<Type>,
}

impl Signature {
    /// Parse and validate a signature.
    pub fn new(signature: impl Into<String>) -> Result<Self, SignatureError> {
        let string = signature.into();
        let types = parse(&string)?;
        Ok(Self { string, types })
    }

    /// The empty signature.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Construct a signature from a sequence of types.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_peer::signature::{Signature, Type};
    ///
    /// let signature = Signature::from_types([Type::String, Type::Array(Box::new(Type::Byte))])?;
    /// assert_eq!(signature, "say");
    /// # Ok::<_, dbus_peer::signature::SignatureError>(())
    /// ```
    pub fn from_types(types: impl IntoIterator<Item = Type>) -> Result<Self, SignatureError> {
        let types = types.into_iter().collect::<Vec<_>>();
        let mut string = String::new();

        for ty in &types {
            ty.write_to(&mut string);
        }

        if string.len() > MAX_SIGNATURE {
            return Err(SignatureError::too_long());
        }

        Ok(Self { string, types })
    }

    /// The textual form of the signature.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.string
    }

    /// The complete types of the signature in order.
    #[inline]
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    /// Test if the signature is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.string.is_empty()
    }
}

impl fmt::Display for Signature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string)
    }
}

impl fmt::Debug for Signature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.string, f)
    }
}

impl FromStr for Signature {
    type Err = SignatureError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Signature {
    type Error = SignatureError;

    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for Signature {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.string
    }
}

impl PartialEq<str> for Signature {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.string == other
    }
}

impl PartialEq<&str> for Signature {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.string == *other
    }
}
