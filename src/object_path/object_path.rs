use std::fmt;
use std::str::FromStr;

use super::{validate, Iter, ObjectPathError};

/// A validated, owned object path.
///
/// The following rules define a [valid object path]. Implementations must not
/// send or accept messages with invalid object paths.
///
/// [valid object path]: https://dbus.freedesktop.org/doc/dbus-specification.html#message-protocol-marshaling-object-path
///
/// * The path may be of any length.
/// * The path must begin with an ASCII '/' (integer 47) character, and must
///   consist of elements separated by slash characters.
/// * Each element must only contain the ASCII characters "[A-Z][a-z][0-9]_"
/// * No element may be the empty string.
/// * Multiple '/' characters cannot occur in sequence.
/// * A trailing '/' character is not allowed unless the path is the root path
///   (a single '/' character).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectPath(Box<str>);

impl ObjectPath {
    /// Construct a new validated object path.
    ///
    /// # Errors
    ///
    /// Errors if the argument is not a valid object path.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_peer::ObjectPath;
    ///
    /// assert!(ObjectPath::new("/org/freedesktop/DBus").is_ok());
    /// assert!(ObjectPath::new("org/freedesktop").is_err());
    /// ```
    pub fn new(path: &str) -> Result<Self, ObjectPathError> {
        if !validate(path.as_bytes()) {
            return Err(ObjectPathError::new(path));
        }

        Ok(Self(path.into()))
    }

    /// The special `"/"` object path.
    pub fn root() -> Self {
        Self("/".into())
    }

    /// Get the object path as a string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Construct an iterator over the components of the object path.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.0)
    }

    /// If `other` is a strict descendant of this path, get the name of the
    /// direct child of this path which leads to it.
    pub fn child_name<'a>(&self, other: &'a ObjectPath) -> Option<&'a str> {
        let rest = if self.0.as_ref() == "/" {
            other.0.strip_prefix('/')?
        } else {
            other.0.strip_prefix(self.0.as_ref())?.strip_prefix('/')?
        };

        rest.split('/').next().filter(|name| !name.is_empty())
    }
}

impl fmt::Display for ObjectPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ObjectPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl FromStr for ObjectPath {
    type Err = ObjectPathError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ObjectPath {
    type Error = ObjectPathError;

    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for ObjectPath {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ObjectPath {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        *self.0 == *other
    }
}

impl PartialEq<&str> for ObjectPath {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        *self.0 == **other
    }
}
