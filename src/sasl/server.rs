use crate::error::{ErrorKind, Result};
use crate::utils::hex_decode;

use super::{Guid, Mechanism, SaslRequest, SaslResponse};

/// The number of failed exchanges a server tolerates before it gives up on a
/// client.
const MAX_FAILURES: usize = 8;

/// The next step the server side of a handshake needs to take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStep {
    /// Send the given bytes and wait for the next line from the client.
    Send(Vec<u8>),
    /// The client sent `BEGIN`, after which binary messages follow.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitingForAuth,
    WaitingForBegin,
    Done,
}

/// The server side of the authentication handshake.
///
/// Any client offering one of the accepted mechanisms with well-formed
/// credentials is accepted. The leading nul byte sent by clients is expected
/// to have been consumed before the first line is passed in.
///
/// # Examples
///
/// ```
/// use dbus_peer::sasl::{Guid, Mechanism, ServerHandshake, ServerStep};
///
/// let guid = Guid::new("0123456789abcdef").unwrap();
/// let mut server = ServerHandshake::new(guid, vec![Mechanism::Anonymous]);
///
/// assert_eq!(
///     server.receive(b"AUTH EXTERNAL 31303030\r\n")?,
///     ServerStep::Send(b"REJECTED ANONYMOUS\r\n".to_vec())
/// );
///
/// assert_eq!(
///     server.receive(b"AUTH ANONYMOUS\r\n")?,
///     ServerStep::Send(b"OK 0123456789abcdef\r\n".to_vec())
/// );
///
/// assert_eq!(server.receive(b"BEGIN\r\n")?, ServerStep::Done);
/// # Ok::<_, dbus_peer::Error>(())
/// ```
#[derive(Debug)]
pub struct ServerHandshake {
    guid: Guid,
    mechanisms: Vec<Mechanism>,
    state: State,
    failures: usize,
}

impl ServerHandshake {
    /// Construct a new server handshake identifying with `guid` and
    /// accepting the given mechanisms.
    pub fn new(guid: Guid, mechanisms: Vec<Mechanism>) -> Self {
        Self {
            guid,
            mechanisms,
            state: State::WaitingForAuth,
            failures: 0,
        }
    }

    /// The guid of the server.
    #[inline]
    pub fn guid(&self) -> &Guid {
        &self.guid
    }

    /// Process a line received from the client.
    pub fn receive(&mut self, line: &[u8]) -> Result<ServerStep> {
        let request = SaslRequest::parse(line)?;
        tracing::debug!(?request, state = ?self.state, "sasl request");

        let mut out = Vec::new();

        match (self.state, request) {
            (
                State::WaitingForAuth,
                SaslRequest::Auth {
                    mechanism,
                    initial_response,
                },
            ) => {
                if self.accepts(mechanism, initial_response) {
                    SaslResponse::Ok(self.guid.clone()).write_to(&mut out);
                    self.state = State::WaitingForBegin;
                } else {
                    self.reject(&mut out)?;
                }
            }
            (State::WaitingForBegin, SaslRequest::Begin) => {
                self.state = State::Done;
                return Ok(ServerStep::Done);
            }
            (State::WaitingForAuth | State::WaitingForBegin, SaslRequest::Cancel)
            | (State::WaitingForAuth, SaslRequest::Error(..)) => {
                self.state = State::WaitingForAuth;
                self.reject(&mut out)?;
            }
            (State::WaitingForBegin, SaslRequest::NegotiateUnixFd) => {
                self.fail(&mut out, b"unix fd passing is not supported")?;
            }
            (State::Done, _) => {
                return Err(ErrorKind::InvalidSasl("handshake already completed".into()).into());
            }
            (_, _) => {
                self.fail(&mut out, b"unexpected command")?;
            }
        }

        Ok(ServerStep::Send(out))
    }

    fn accepts(&self, mechanism: Option<&[u8]>, initial_response: Option<&[u8]>) -> bool {
        let Some(mechanism) = mechanism.and_then(Mechanism::from_name) else {
            return false;
        };

        if !self.mechanisms.contains(&mechanism) {
            return false;
        }

        match initial_response {
            Some(data) => hex_decode(data).is_some(),
            None => true,
        }
    }

    fn reject(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.count_failure()?;

        let names = self
            .mechanisms
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join(" ");

        SaslResponse::Rejected(names.as_bytes()).write_to(out);
        Ok(())
    }

    fn fail(&mut self, out: &mut Vec<u8>, message: &[u8]) -> Result<()> {
        self.count_failure()?;
        SaslResponse::Error(message).write_to(out);
        Ok(())
    }

    fn count_failure(&mut self) -> Result<()> {
        self.failures += 1;

        if self.failures > MAX_FAILURES {
            self.state = State::Done;
            return Err(ErrorKind::AuthenticationFailed.into());
        }

        Ok(())
    }
}
