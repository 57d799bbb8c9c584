//! Typed D-Bus messages and their framing on the wire.

#[cfg(test)]
mod tests;

pub use self::message_kind::MessageKind;
mod message_kind;

pub use self::message::Message;
mod message;

pub use self::frame::{read_message, write_message};
mod frame;

pub use self::codec::MessageCodec;
mod codec;
