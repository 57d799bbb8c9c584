//! Connections to D-Bus peers.
//!
//! A [`Connection`] owns a byte stream, performs the SASL handshake over it
//! and then exchanges framed messages until the stream closes. Streams are
//! either provided directly or resolved from an [`Address`].

#[cfg(test)]
mod tests;

pub use self::address::Address;
mod address;

pub use self::transport::{ChildStdio, Transport};
mod transport;

pub use self::builder::ConnectionBuilder;
mod builder;

pub use self::connection::{Connection, ConnectionState, Event, Events};
mod connection;
