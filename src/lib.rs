//! An asynchronous D-Bus peer for Tokio.
//!
//! The crate covers the layers of a D-Bus implementation from the bottom up:
//!
//! * [`signature`] parses type signatures and [`buf`] encodes and decodes
//!   [`Value`]s under them.
//! * [`message`] frames complete messages on top of the value codec.
//! * [`sasl`] implements the authentication handshake from both sides.
//! * [`connection`] owns a transport, runs the handshake and exchanges
//!   messages in the background.
//! * [`Bus`] correlates replies with calls, delivers signals and dispatches
//!   calls to exported [`object`]s.
//!
//! # Examples
//!
//! ```no_run
//! use dbus_peer::object::{Interface, InterfaceDesc};
//! use dbus_peer::{Bus, ObjectPath, Value};
//!
//! # #[tokio::main] async fn main() -> dbus_peer::Result<()> {
//! let bus = Bus::session_bus().await?;
//!
//! let desc = InterfaceDesc::new("se.tedro.Echo")?.with_method("Echo", "s", "s")?;
//!
//! let interface = Interface::new(desc).method("Echo", |call| async move {
//!     Ok(call.into_args())
//! });
//!
//! bus.export(ObjectPath::new("/se/tedro/Echo")?, interface);
//! bus.closed().await;
//! # Ok(()) }
//! ```

#[macro_use]
mod macros;

pub mod proto;

#[doc(inline)]
pub use self::error::{Error, ErrorKind, RemoteError, Result};
mod error;

#[doc(inline)]
pub use self::signature::{Signature, SignatureError, Type};
pub mod signature;

#[doc(inline)]
pub use self::object_path::{ObjectPath, ObjectPathError};
pub mod object_path;

#[doc(inline)]
pub use self::value::{Array, Value};
mod value;

pub use self::buf::{ReadBuf, WriteBuf};
pub mod buf;

#[doc(inline)]
pub use self::message::{Message, MessageKind};
pub mod message;

pub mod sasl;

#[doc(inline)]
pub use self::connection::{Connection, ConnectionBuilder};
pub mod connection;

#[doc(inline)]
pub use self::server::Server;
mod server;

#[doc(inline)]
pub use self::bus::{Bus, Subscription};
mod bus;

pub mod object;

pub mod org_freedesktop_dbus;

mod utils;
