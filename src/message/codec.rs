use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::Error;
use crate::proto::Endianness;
use crate::Message;

use super::frame::{read_frame, Frame};
use super::write_message;

/// Codec which frames D-Bus messages over a byte stream once the
/// authentication handshake has completed.
///
/// Incoming messages may use either endianness. Outgoing messages are
/// written with the endianness the codec was constructed with.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCodec {
    endianness: Endianness,
}

impl MessageCodec {
    /// Construct a new codec writing messages with native endianness.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a new codec writing messages with the given endianness.
    pub fn with_endianness(endianness: Endianness) -> Self {
        Self { endianness }
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some((frame, n)) = read_frame(&src[..])? else {
                src.reserve(crate::proto::FIXED_HEADER_LENGTH);
                return Ok(None);
            };

            src.advance(n);

            match frame {
                Frame::Message(message) => {
                    tracing::trace!(?message, "received");
                    return Ok(Some(message));
                }
                Frame::Unknown(message_type) => {
                    tracing::trace!(?message_type, len = n, "skipping message of unknown type");
                }
            }
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, message: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut out = Vec::new();
        write_message(&message, self.endianness, &mut out)?;
        tracing::trace!(?message, len = out.len(), "sending");
        dst.extend_from_slice(&out);
        Ok(())
    }
}
