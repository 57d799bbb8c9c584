use std::num::NonZeroU32;

use crate::error::{ErrorKind, Result};
use crate::proto::{Flags, MessageType};
use crate::signature::Signature;
use crate::{MessageKind, ObjectPath, Value};

/// A D-Bus message.
///
/// The serial of a message is assigned when it is sent unless one has been
/// set explicitly.
///
/// # Examples
///
/// ```
/// use dbus_peer::{Message, MessageKind, ObjectPath, Value};
///
/// let m = Message::method_call(ObjectPath::new("/org/freedesktop/DBus")?, "Hello")
///     .with_interface("org.freedesktop.DBus")
///     .with_destination("org.freedesktop.DBus");
///
/// assert!(matches!(m.kind(), MessageKind::MethodCall { .. }));
/// assert_eq!(m.member(), Some("Hello"));
/// assert!(m.serial().is_none());
/// assert!(m.body().is_empty());
///
/// let m = m.with_values(vec![Value::from("se.tedro.DBusExample"), Value::from(4u32)])?;
/// assert_eq!(m.signature(), "su");
/// # Ok::<_, dbus_peer::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub(crate) kind: MessageKind,
    pub(crate) serial: Option<NonZeroU32>,
    pub(crate) flags: Flags,
    pub(crate) interface: Option<Box<str>>,
    pub(crate) destination: Option<Box<str>>,
    pub(crate) sender: Option<Box<str>>,
    pub(crate) signature: Signature,
    pub(crate) body: Vec<Value>,
}

impl Message {
    fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            serial: None,
            flags: Flags::EMPTY,
            interface: None,
            destination: None,
            sender: None,
            signature: Signature::empty(),
            body: Vec::new(),
        }
    }

    /// Construct a method call [`Message`].
    pub fn method_call(path: ObjectPath, member: impl Into<Box<str>>) -> Self {
        Self::new(MessageKind::MethodCall {
            path,
            member: member.into(),
        })
    }

    /// Construct a signal [`Message`]. Signals always carry an interface.
    pub fn signal(
        path: ObjectPath,
        interface: impl Into<Box<str>>,
        member: impl Into<Box<str>>,
    ) -> Self {
        Self::new(MessageKind::Signal {
            path,
            member: member.into(),
        })
        .with_interface(interface)
    }

    /// Construct a method return replying to `reply_serial`.
    pub fn method_return(reply_serial: NonZeroU32) -> Self {
        Self::new(MessageKind::MethodReturn { reply_serial })
    }

    /// Construct an error replying to `reply_serial`.
    pub fn error(error_name: impl Into<Box<str>>, reply_serial: NonZeroU32) -> Self {
        Self::new(MessageKind::Error {
            error_name: error_name.into(),
            reply_serial,
        })
    }

    /// Construct a method return to this message, addressed back to its
    /// sender.
    ///
    /// Returns `None` if this message has not been assigned a serial.
    pub fn reply(&self) -> Option<Self> {
        let mut m = Self::method_return(self.serial?);
        m.destination = self.sender.clone();
        Some(m)
    }

    /// Construct an error reply to this message, addressed back to its
    /// sender.
    ///
    /// Returns `None` if this message has not been assigned a serial.
    pub fn error_reply(&self, error_name: impl Into<Box<str>>) -> Option<Self> {
        let mut m = Self::error(error_name, self.serial?);
        m.destination = self.sender.clone();
        Some(m)
    }

    /// Get the kind of the message.
    #[inline]
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// The wire type of the message.
    #[inline]
    pub fn message_type(&self) -> MessageType {
        self.kind.message_type()
    }

    /// Get the serial of the message.
    #[inline]
    pub fn serial(&self) -> Option<NonZeroU32> {
        self.serial
    }

    /// Modify the serial of the message.
    #[must_use]
    pub fn with_serial(self, serial: NonZeroU32) -> Self {
        Self {
            serial: Some(serial),
            ..self
        }
    }

    /// Get the flags of the message.
    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Modify the flags of the message.
    #[must_use]
    pub fn with_flags(self, flags: Flags) -> Self {
        Self { flags, ..self }
    }

    /// The object path of a method call or signal.
    pub fn path(&self) -> Option<&ObjectPath> {
        match &self.kind {
            MessageKind::MethodCall { path, .. } | MessageKind::Signal { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The member of a method call or signal.
    pub fn member(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::MethodCall { member, .. } | MessageKind::Signal { member, .. } => {
                Some(member)
            }
            _ => None,
        }
    }

    /// The error name of an error.
    pub fn error_name(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Error { error_name, .. } => Some(error_name),
            _ => None,
        }
    }

    /// The serial a method return or error replies to.
    pub fn reply_serial(&self) -> Option<NonZeroU32> {
        match self.kind {
            MessageKind::MethodReturn { reply_serial }
            | MessageKind::Error { reply_serial, .. } => Some(reply_serial),
            _ => None,
        }
    }

    /// Get the interface of the message.
    #[inline]
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Modify the interface of the message.
    #[must_use]
    pub fn with_interface(self, interface: impl Into<Box<str>>) -> Self {
        Self {
            interface: Some(interface.into()),
            ..self
        }
    }

    /// Get the destination of the message.
    #[inline]
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Modify the destination of the message.
    #[must_use]
    pub fn with_destination(self, destination: impl Into<Box<str>>) -> Self {
        Self {
            destination: Some(destination.into()),
            ..self
        }
    }

    /// Get the sender of the message.
    #[inline]
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    /// Modify the sender of the message.
    #[must_use]
    pub fn with_sender(self, sender: impl Into<Box<str>>) -> Self {
        Self {
            sender: Some(sender.into()),
            ..self
        }
    }

    /// Get the signature of the body.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Get the body of the message.
    #[inline]
    pub fn body(&self) -> &[Value] {
        &self.body
    }

    /// Convert into the body of the message.
    #[inline]
    pub fn into_body(self) -> Vec<Value> {
        self.body
    }

    /// Modify the body of the message.
    ///
    /// # Errors
    ///
    /// Errors if the values do not match the complete types of `signature`.
    pub fn with_body(self, signature: Signature, body: Vec<Value>) -> Result<Self> {
        let matches = body.len() == signature.types().len()
            && body
                .iter()
                .zip(signature.types())
                .all(|(value, ty)| value.conforms_to(ty));

        if !matches {
            return Err(ErrorKind::ValueMismatch {
                expected: signature.to_string(),
            }
            .into());
        }

        Ok(Self {
            signature,
            body,
            ..self
        })
    }

    /// Modify the body of the message, deriving the signature from the types
    /// of the values.
    pub fn with_values(self, body: Vec<Value>) -> Result<Self> {
        let signature = Signature::from_types(body.iter().map(Value::ty))?;

        Ok(Self {
            signature,
            body,
            ..self
        })
    }
}
