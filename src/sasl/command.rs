use crate::error::{Error, ErrorKind, Result};
use crate::utils::{split_once, trim_end};

use super::Guid;

fn invalid(line: &[u8]) -> Error {
    Error::new(ErrorKind::InvalidSasl(
        String::from_utf8_lossy(line).into_owned().into(),
    ))
}

/// Split a line into its command and the rest of its arguments.
fn command(line: &[u8]) -> (&[u8], &[u8]) {
    let line = trim_end(line);
    split_once(line, b' ').unwrap_or((line, &[]))
}

fn non_empty(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.is_empty() {
        None
    } else {
        Some(bytes)
    }
}

/// A SASL command sent from the client to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SaslRequest<'a> {
    /// The AUTH command, optionally with a mechanism and hex encoded initial
    /// response.
    Auth {
        mechanism: Option<&'a [u8]>,
        initial_response: Option<&'a [u8]>,
    },
    /// The DATA command with hex encoded data.
    Data(&'a [u8]),
    /// The BEGIN command.
    Begin,
    /// The CANCEL command.
    Cancel,
    /// The ERROR command with an optional explanation.
    Error(&'a [u8]),
    /// The NEGOTIATE_UNIX_FD command.
    NegotiateUnixFd,
}

impl<'a> SaslRequest<'a> {
    /// Parse a single line, with or without its line terminator.
    pub fn parse(line: &'a [u8]) -> Result<Self> {
        let (command, rest) = command(line);

        let request = match command {
            b"AUTH" => {
                let (mechanism, initial_response) = split_once(rest, b' ').unwrap_or((rest, &[]));

                SaslRequest::Auth {
                    mechanism: non_empty(mechanism),
                    initial_response: non_empty(initial_response),
                }
            }
            b"DATA" => SaslRequest::Data(rest),
            b"BEGIN" => SaslRequest::Begin,
            b"CANCEL" => SaslRequest::Cancel,
            b"ERROR" => SaslRequest::Error(rest),
            b"NEGOTIATE_UNIX_FD" => SaslRequest::NegotiateUnixFd,
            _ => return Err(invalid(line)),
        };

        Ok(request)
    }

    /// Write the command followed by a line terminator.
    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        match *self {
            SaslRequest::Auth {
                mechanism,
                initial_response,
            } => {
                out.extend_from_slice(b"AUTH");

                if let Some(mechanism) = mechanism {
                    out.push(b' ');
                    out.extend_from_slice(mechanism);

                    if let Some(initial_response) = initial_response {
                        out.push(b' ');
                        out.extend_from_slice(initial_response);
                    }
                }
            }
            SaslRequest::Data(data) => {
                out.extend_from_slice(b"DATA");

                if !data.is_empty() {
                    out.push(b' ');
                    out.extend_from_slice(data);
                }
            }
            SaslRequest::Begin => out.extend_from_slice(b"BEGIN"),
            SaslRequest::Cancel => out.extend_from_slice(b"CANCEL"),
            SaslRequest::Error(message) => {
                out.extend_from_slice(b"ERROR");

                if !message.is_empty() {
                    out.push(b' ');
                    out.extend_from_slice(message);
                }
            }
            SaslRequest::NegotiateUnixFd => out.extend_from_slice(b"NEGOTIATE_UNIX_FD"),
        }

        out.extend_from_slice(b"\r\n");
    }
}

/// A SASL command sent from the server to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SaslResponse<'a> {
    /// The OK command carrying the guid of the server.
    Ok(Guid),
    /// The REJECTED command listing the mechanisms the server supports.
    Rejected(&'a [u8]),
    /// The DATA command with hex encoded data.
    Data(&'a [u8]),
    /// The ERROR command with an optional explanation.
    Error(&'a [u8]),
    /// The AGREE_UNIX_FD command.
    AgreeUnixFd,
}

impl<'a> SaslResponse<'a> {
    /// Parse a single line, with or without its line terminator.
    pub fn parse(line: &'a [u8]) -> Result<Self> {
        let (command, rest) = command(line);

        let response = match command {
            b"OK" => {
                let guid = std::str::from_utf8(rest)
                    .ok()
                    .and_then(Guid::new)
                    .ok_or_else(|| invalid(line))?;

                SaslResponse::Ok(guid)
            }
            b"REJECTED" => SaslResponse::Rejected(rest),
            b"DATA" => SaslResponse::Data(rest),
            b"ERROR" => SaslResponse::Error(rest),
            b"AGREE_UNIX_FD" => SaslResponse::AgreeUnixFd,
            _ => return Err(invalid(line)),
        };

        Ok(response)
    }

    /// Iterate over the mechanisms of a `REJECTED` response.
    pub fn mechanisms(&self) -> impl Iterator<Item = &'a [u8]> {
        let rest: &'a [u8] = match *self {
            SaslResponse::Rejected(rest) => rest,
            _ => &[],
        };

        rest.split(|&b| b == b' ').filter(|m| !m.is_empty())
    }

    /// Write the command followed by a line terminator.
    pub(crate) fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            SaslResponse::Ok(guid) => {
                out.extend_from_slice(b"OK ");
                out.extend_from_slice(guid.as_str().as_bytes());
            }
            SaslResponse::Rejected(mechanisms) => {
                out.extend_from_slice(b"REJECTED");

                if !mechanisms.is_empty() {
                    out.push(b' ');
                    out.extend_from_slice(mechanisms);
                }
            }
            SaslResponse::Data(data) => {
                out.extend_from_slice(b"DATA");

                if !data.is_empty() {
                    out.push(b' ');
                    out.extend_from_slice(data);
                }
            }
            SaslResponse::Error(message) => {
                out.extend_from_slice(b"ERROR");

                if !message.is_empty() {
                    out.push(b' ');
                    out.extend_from_slice(message);
                }
            }
            SaslResponse::AgreeUnixFd => out.extend_from_slice(b"AGREE_UNIX_FD"),
        }

        out.extend_from_slice(b"\r\n");
    }
}
