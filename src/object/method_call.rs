use thiserror::Error;

use crate::org_freedesktop_dbus::{ERROR_FAILED, ERROR_INVALID_ARGS};
use crate::{Message, Value};

use super::SignalEmitter;

/// An incoming method call handed to an exported implementation.
pub struct MethodCall {
    message: Message,
    emitter: SignalEmitter,
}

impl MethodCall {
    pub(crate) fn new(message: Message, emitter: SignalEmitter) -> Self {
        Self { message, emitter }
    }

    /// The message of the call, for access to headers such as the sender.
    #[inline]
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The arguments of the call.
    #[inline]
    pub fn args(&self) -> &[Value] {
        self.message.body()
    }

    /// Get the argument at `index`.
    ///
    /// Fails with an `InvalidArgs` error if it is missing.
    pub fn arg(&self, index: usize) -> Result<&Value, MethodError> {
        self.args()
            .get(index)
            .ok_or_else(|| MethodError::invalid_args(format!("missing argument {index}")))
    }

    /// Take the arguments of the call.
    #[inline]
    pub fn into_args(self) -> Vec<Value> {
        self.message.into_body()
    }

    /// The emitter for signals of the interface being called.
    #[inline]
    pub fn emitter(&self) -> &SignalEmitter {
        &self.emitter
    }
}

/// The failure of an exported method, sent back to the caller as an error
/// reply.
///
/// # Examples
///
/// ```
/// use dbus_peer::object::MethodError;
///
/// let error = MethodError::new("se.tedro.Error.Overflow", "result does not fit");
/// assert_eq!(error.name(), "se.tedro.Error.Overflow");
///
/// let error = MethodError::failed("boom");
/// assert_eq!(error.name(), "org.freedesktop.DBus.Error.Failed");
/// assert_eq!(error.message(), "boom");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct MethodError {
    name: Box<str>,
    message: Box<str>,
}

impl MethodError {
    /// Construct an error with an explicit error name.
    pub fn new(name: impl Into<Box<str>>, message: impl Into<Box<str>>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Construct a generic `org.freedesktop.DBus.Error.Failed` error.
    pub fn failed(message: impl Into<Box<str>>) -> Self {
        Self::new(ERROR_FAILED, message)
    }

    /// Construct an `org.freedesktop.DBus.Error.InvalidArgs` error.
    pub fn invalid_args(message: impl Into<Box<str>>) -> Self {
        Self::new(ERROR_INVALID_ARGS, message)
    }

    /// The D-Bus error name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The human readable error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<crate::Error> for MethodError {
    #[inline]
    fn from(error: crate::Error) -> Self {
        Self::failed(error.to_string())
    }
}
