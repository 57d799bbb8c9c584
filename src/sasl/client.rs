use crate::error::{ErrorKind, Result};

use super::{Auth, Guid, SaslRequest, SaslResponse};

/// The next step the client side of a handshake needs to take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientStep {
    /// Send the given bytes and wait for the next line from the server.
    Send(Vec<u8>),
    /// Send the given bytes, after which the handshake is complete and binary
    /// messages follow.
    Done(Guid, Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    WaitingForOk,
    WaitingForReject,
    Done,
}

/// The client side of the authentication handshake.
///
/// This only deals with lines and does not perform any I/O.
///
/// # Examples
///
/// ```
/// use dbus_peer::sasl::{Auth, ClientHandshake, ClientStep};
///
/// let mut client = ClientHandshake::new(vec![Auth::external_from_u32_ascii_hex(1000)]);
/// assert_eq!(client.start()?, b"\0AUTH EXTERNAL 31303030\r\n");
///
/// let ClientStep::Done(guid, out) = client.receive(b"OK 0123456789abcdef\r\n")? else {
///     panic!("expected handshake to complete");
/// };
///
/// assert_eq!(guid.as_str(), "0123456789abcdef");
/// assert_eq!(out, b"BEGIN\r\n");
/// # Ok::<_, dbus_peer::Error>(())
/// ```
#[derive(Debug)]
pub struct ClientHandshake {
    mechanisms: Vec<Auth>,
    current: usize,
    state: State,
}

impl ClientHandshake {
    /// Construct a new client handshake trying the given mechanisms in
    /// order.
    pub fn new(mechanisms: Vec<Auth>) -> Self {
        Self {
            mechanisms,
            current: 0,
            state: State::Init,
        }
    }

    /// Start the handshake, returning the leading nul byte followed by the
    /// first `AUTH` command.
    pub fn start(&mut self) -> Result<Vec<u8>> {
        if self.state != State::Init {
            return Err(ErrorKind::InvalidSasl("handshake already started".into()).into());
        }

        let mut out = vec![0];
        self.auth(&mut out)?;
        Ok(out)
    }

    /// Process a line received from the server.
    pub fn receive(&mut self, line: &[u8]) -> Result<ClientStep> {
        let response = SaslResponse::parse(line)?;
        tracing::debug!(?response, state = ?self.state, "sasl response");

        let mut out = Vec::new();

        match (self.state, response) {
            (State::WaitingForOk, SaslResponse::Ok(guid)) => {
                SaslRequest::Begin.write_to(&mut out);
                self.state = State::Done;
                return Ok(ClientStep::Done(guid, out));
            }
            (State::WaitingForOk | State::WaitingForReject, SaslResponse::Rejected(..)) => {
                self.current += 1;
                self.auth(&mut out)?;
            }
            (State::WaitingForOk, SaslResponse::Data(..)) => {
                // EXTERNAL and ANONYMOUS answer a challenge with their
                // initial response.
                let data = self
                    .mechanisms
                    .get(self.current)
                    .and_then(Auth::initial_response)
                    .unwrap_or_default();

                SaslRequest::Data(data).write_to(&mut out);
            }
            (State::WaitingForOk, SaslResponse::Error(..)) => {
                SaslRequest::Cancel.write_to(&mut out);
                self.state = State::WaitingForReject;
            }
            (_, response) => {
                let message = format!("unexpected {response:?}");
                return Err(ErrorKind::InvalidSasl(message.into()).into());
            }
        }

        Ok(ClientStep::Send(out))
    }

    /// Write the `AUTH` command for the current mechanism.
    fn auth(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let Some(auth) = self.mechanisms.get(self.current) else {
            self.state = State::Done;
            return Err(ErrorKind::AuthenticationFailed.into());
        };

        tracing::debug!(mechanism = %auth.mechanism(), "sasl auth");

        SaslRequest::Auth {
            mechanism: Some(auth.mechanism().name().as_bytes()),
            initial_response: auth.initial_response(),
        }
        .write_to(out);

        self.state = State::WaitingForOk;
        Ok(())
    }
}
