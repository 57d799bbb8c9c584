//! Objects exported on a [`Bus`](crate::Bus).
//!
//! An exported object is an [`Interface`] implementation registered under an
//! object path. The interface is described by an [`InterfaceDesc`], which
//! determines how incoming calls are checked, how replies are encoded and
//! what introspection reports.


pub use self::interface_desc::{Access, InterfaceDesc, MethodDesc, PropertyDesc, SignalDesc};
mod interface_desc;

pub use self::interface::{Interface, MethodResult};
pub(crate) use self::interface::MethodHandler;
mod interface;

pub use self::method_call::{MethodCall, MethodError};
mod method_call;

pub use self::signal_emitter::SignalEmitter;
mod signal_emitter;

pub(crate) use self::registry::Registry;
mod registry;
