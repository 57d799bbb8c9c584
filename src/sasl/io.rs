use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ErrorKind, Result};

use super::{ClientHandshake, ClientStep, Guid, ServerHandshake, ServerStep};

/// The longest line accepted during a handshake.
const MAX_LINE: usize = 16384;

/// Line-oriented reader over the raw stream before binary framing starts.
///
/// Bytes which arrive after the last line are kept so that they can be
/// handed over to the message codec.
struct LineReader {
    buf: BytesMut,
}

impl LineReader {
    fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
        }
    }

    async fn fill<S>(&mut self, stream: &mut S) -> Result<()>
    where
        S: AsyncRead + Unpin,
    {
        if stream.read_buf(&mut self.buf).await? == 0 {
            return Err(ErrorKind::ConnectionClosed.into());
        }

        Ok(())
    }

    async fn read_nul<S>(&mut self, stream: &mut S) -> Result<()>
    where
        S: AsyncRead + Unpin,
    {
        while self.buf.is_empty() {
            self.fill(stream).await?;
        }

        if self.buf[0] != 0 {
            return Err(ErrorKind::InvalidSasl("missing leading nul byte".into()).into());
        }

        self.buf.advance(1);
        Ok(())
    }

    async fn read_line<S>(&mut self, stream: &mut S) -> Result<BytesMut>
    where
        S: AsyncRead + Unpin,
    {
        loop {
            if let Some(n) = self.buf.windows(2).position(|w| w == b"\r\n") {
                return Ok(self.buf.split_to(n + 2));
            }

            if self.buf.len() > MAX_LINE {
                return Err(ErrorKind::InvalidSasl("line too long".into()).into());
            }

            self.fill(stream).await?;
        }
    }
}

async fn send<S>(stream: &mut S, bytes: &[u8]) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(bytes).await?;
    stream.flush().await?;
    Ok(())
}

/// Drive the client side of a handshake over `stream`.
///
/// Returns the guid of the server and any bytes received past the end of
/// the handshake.
pub async fn client_handshake<S>(
    stream: &mut S,
    mut handshake: ClientHandshake,
) -> Result<(Guid, BytesMut)>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut reader = LineReader::new();
    send(stream, &handshake.start()?).await?;

    loop {
        let line = reader.read_line(stream).await?;

        match handshake.receive(&line)? {
            ClientStep::Send(out) => {
                send(stream, &out).await?;
            }
            ClientStep::Done(guid, out) => {
                send(stream, &out).await?;
                tracing::debug!(%guid, "client handshake complete");
                return Ok((guid, reader.buf));
            }
        }
    }
}

/// Drive the server side of a handshake over `stream`.
///
/// Returns any bytes received past the final `BEGIN`.
pub async fn server_handshake<S>(stream: &mut S, mut handshake: ServerHandshake) -> Result<BytesMut>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut reader = LineReader::new();
    reader.read_nul(stream).await?;

    loop {
        let line = reader.read_line(stream).await?;

        match handshake.receive(&line)? {
            ServerStep::Send(out) => {
                send(stream, &out).await?;
            }
            ServerStep::Done => {
                tracing::debug!(guid = %handshake.guid(), "server handshake complete");
                return Ok(reader.buf);
            }
        }
    }
}
