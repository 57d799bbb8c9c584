use std::fmt;
use std::sync::Arc;

use crate::error::{ErrorKind, Result};
use crate::{Bus, Message, ObjectPath, Value};

use super::InterfaceDesc;

/// Emits the signals declared by an exported interface.
///
/// Emitting a signal delivers it to local subscribers of the bus and sends
/// it to the peer.
#[derive(Clone)]
pub struct SignalEmitter {
    bus: Bus,
    path: ObjectPath,
    desc: Arc<InterfaceDesc>,
}

impl SignalEmitter {
    pub(crate) fn new(bus: Bus, path: ObjectPath, desc: Arc<InterfaceDesc>) -> Self {
        Self { bus, path, desc }
    }

    /// The path the interface is exported at.
    #[inline]
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// The name of the interface.
    #[inline]
    pub fn interface(&self) -> &str {
        self.desc.name()
    }

    /// Emit the signal `member` with the given body.
    ///
    /// # Errors
    ///
    /// Errors if the interface does not declare the signal, or if the body
    /// does not match its declared signature.
    pub fn emit(&self, member: &str, body: Vec<Value>) -> Result<()> {
        let Some(signal) = self.desc.signal(member) else {
            return Err(ErrorKind::UnknownSignal(member.into()).into());
        };

        let message = Message::signal(self.path.clone(), self.desc.name(), member)
            .with_body(signal.args().clone(), body)?;

        self.bus.emit(message);
        Ok(())
    }
}

impl fmt::Debug for SignalEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalEmitter")
            .field("path", &self.path)
            .field("interface", &self.desc.name())
            .finish()
    }
}
