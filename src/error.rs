use std::io;
use std::str::Utf8Error;

use thiserror::Error;

use crate::signature::SignatureError;
use crate::{ObjectPathError, Value};

/// Result alias using an [`Error`] as the error type by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error raised by this crate.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Self { kind }
    }

    /// The kind of the error.
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Convert into the kind of the error.
    #[inline]
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// Test if the error indicates that more bytes are needed.
    #[inline]
    pub fn is_buffer_underrun(&self) -> bool {
        matches!(self.kind, ErrorKind::BufferUnderrun { .. })
    }

    /// Get the error reply sent by the remote peer, if this error is one.
    #[inline]
    pub fn remote(&self) -> Option<&RemoteError> {
        match &self.kind {
            ErrorKind::Remote(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<SignatureError> for Error {
    #[inline]
    fn from(error: SignatureError) -> Self {
        Self::new(ErrorKind::Signature(error))
    }
}

impl From<ObjectPathError> for Error {
    #[inline]
    fn from(error: ObjectPathError) -> Self {
        Self::new(ErrorKind::ObjectPath(error))
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(error: io::Error) -> Self {
        Self::new(ErrorKind::Io(error))
    }
}

impl From<Utf8Error> for Error {
    #[inline]
    fn from(error: Utf8Error) -> Self {
        Self::new(ErrorKind::InvalidUtf8(error))
    }
}

/// The kind of an [`Error`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
    /// Malformed signature, including over-long signatures and unknown type
    /// codes.
    #[error("Malformed signature: {0}")]
    Signature(#[source] SignatureError),
    /// Malformed object path.
    #[error("{0}")]
    ObjectPath(#[source] ObjectPathError),
    /// String does not contain valid UTF-8.
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[source] Utf8Error),
    /// More bytes are needed than are available.
    #[error("Buffer underrun: needed {needed} bytes but only {available} are available")]
    BufferUnderrun { needed: usize, available: usize },
    /// The declared length of an array does not match the bytes consumed by
    /// its elements.
    #[error("Array declared {declared} bytes but its elements consumed {consumed}")]
    ArrayLengthMismatch { declared: u32, consumed: usize },
    /// The declared body length does not match the bytes consumed by the body
    /// signature.
    #[error("Body declared {declared} bytes but its signature consumed {consumed}")]
    BodyLengthMismatch { declared: u32, consumed: usize },
    #[error("Array of length {0} is too long (max is 67108864)")]
    ArrayTooLong(u32),
    #[error("Body of length {0} is too long (max is 134217728)")]
    BodyTooLong(u32),
    #[error("Message of length {0} is too long (max is 134217728)")]
    MessageTooLong(usize),
    #[error("Containers are nested deeper than 64 levels")]
    NestingTooDeep,
    #[error("Boolean value {0} is neither 0 nor 1")]
    InvalidBoolean(u32),
    #[error("String is not null terminated")]
    NotNulTerminated,
    /// A value does not have the shape described by its signature.
    #[error("Value does not match expected type `{expected}`")]
    ValueMismatch { expected: String },
    #[error("Invalid endianness byte {0:#04x}")]
    InvalidEndianness(u8),
    #[error("Unsupported protocol version {0}")]
    InvalidProtocol(u8),
    #[error("Invalid message type {0}")]
    InvalidMessageType(u8),
    #[error("Missing required {0} header")]
    MissingHeader(&'static str),
    #[error("Header field {0} has the wrong type")]
    InvalidHeaderField(u8),
    #[error("Zero in header serial")]
    ZeroSerial,
    /// The authentication handshake could not agree on a mechanism.
    #[error("Authentication failed")]
    AuthenticationFailed,
    /// A handshake line could not be understood.
    #[error("Invalid SASL message {0:?}")]
    InvalidSasl(Box<str>),
    #[error("Invalid d-bus address {0:?}")]
    InvalidAddress(Box<str>),
    #[error("Unknown address family {0:?}")]
    UnknownAddressFamily(Box<str>),
    #[error("Missing bus to connect to")]
    MissingBus,
    /// The connection closed before the operation could complete.
    #[error("Connection closed")]
    ConnectionClosed,
    /// Only method calls can be invoked.
    #[error("Only method calls can be invoked")]
    NotMethodCall,
    /// The remote peer replied with an error.
    #[error("{0}")]
    Remote(RemoteError),
    /// A member name is empty, too long or contains invalid characters.
    #[error("Invalid member name {0:?}")]
    InvalidMemberName(Box<str>),
    /// An interface name is not made up of at least two valid elements.
    #[error("Invalid interface name {0:?}")]
    InvalidInterfaceName(Box<str>),
    /// A signal which is not declared by the exported interface was emitted.
    #[error("Signal {0:?} is not declared by the interface")]
    UnknownSignal(Box<str>),
}

/// An error reply received from a remote peer.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    name: Box<str>,
    message: Box<str>,
    body: Vec<Value>,
}

impl RemoteError {
    pub(crate) fn new(name: &str, body: Vec<Value>) -> Self {
        let message = match body.first() {
            Some(Value::String(message)) => message.as_str().into(),
            _ => Box::default(),
        };

        Self {
            name: name.into(),
            message,
            body,
        }
    }

    /// The D-Bus error name, such as
    /// `org.freedesktop.DBus.Error.UnknownMethod`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The descriptive text of the error, taken from the first body value if
    /// it is a string.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The full body of the error reply.
    #[inline]
    pub fn body(&self) -> &[Value] {
        &self.body
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}
