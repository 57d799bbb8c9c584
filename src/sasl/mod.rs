//! Types related to SASL authentication which D-Bus performs.
//!
//! The handshake is a line-oriented exchange which happens once per
//! connection before any binary messages are sent. [`ClientHandshake`] and
//! [`ServerHandshake`] implement both sides without performing any I/O, and
//! [`client_handshake`] and [`server_handshake`] drive them over a stream.

#[cfg(test)]
mod tests;

pub use self::auth::{Auth, Mechanism};
mod auth;

pub use self::guid::Guid;
mod guid;

pub use self::command::{SaslRequest, SaslResponse};
mod command;

pub use self::client::{ClientHandshake, ClientStep};
mod client;

pub use self::server::{ServerHandshake, ServerStep};
mod server;

pub use self::io::{client_handshake, server_handshake};
mod io;
