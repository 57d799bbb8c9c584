use std::fmt;

use crate::error::{Error, ErrorKind, Result};
use crate::utils::hex_decode;

/// A single parsed server address, such as `unix:path=/run/bus` or
/// `tcp:host=localhost,port=4000`.
///
/// # Examples
///
/// ```
/// use dbus_peer::connection::Address;
///
/// let addresses = Address::parse_list("unix:abstract=/tmp/dbus-x;tcp:host=example.com,port=4000")?;
///
/// assert_eq!(addresses.len(), 2);
/// assert_eq!(addresses[0].transport(), "unix");
/// assert_eq!(addresses[0].get("abstract"), Some("/tmp/dbus-x"));
/// assert_eq!(addresses[1].get("port"), Some("4000"));
/// # Ok::<_, dbus_peer::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    transport: Box<str>,
    params: Vec<(Box<str>, Box<str>)>,
}

impl Address {
    /// Parse a single address.
    pub fn parse(address: &str) -> Result<Self> {
        let Some((transport, rest)) = address.split_once(':') else {
            return Err(invalid(address));
        };

        if transport.is_empty() {
            return Err(invalid(address));
        }

        let mut params = Vec::new();

        for pair in rest.split(',').filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(invalid(address));
            };

            if key.is_empty() {
                return Err(invalid(address));
            }

            let value = unescape(value).ok_or_else(|| invalid(address))?;
            params.push((key.into(), value.into()));
        }

        Ok(Self {
            transport: transport.into(),
            params,
        })
    }

    /// Parse a `;` separated list of addresses, skipping empty entries.
    pub fn parse_list(addresses: &str) -> Result<Vec<Self>> {
        addresses
            .split(';')
            .filter(|a| !a.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// The transport of the address, such as `unix` or `tcp`.
    #[inline]
    pub fn transport(&self) -> &str {
        &self.transport
    }

    /// Get the value of a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| &**v)
    }

    /// Iterate over all key-value pairs in order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (&**k, &**v))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.transport)?;

        for (n, (key, value)) in self.params.iter().enumerate() {
            if n > 0 {
                f.write_str(",")?;
            }

            write!(f, "{key}=")?;

            for b in value.bytes() {
                if b.is_ascii_alphanumeric() || b"-_/.\\*".contains(&b) {
                    write!(f, "{}", char::from(b))?;
                } else {
                    write!(f, "%{b:02x}")?;
                }
            }
        }

        Ok(())
    }
}

fn invalid(address: &str) -> Error {
    Error::new(ErrorKind::InvalidAddress(address.into()))
}

/// Decode `%xx` escapes in an address value.
fn unescape(value: &str) -> Option<String> {
    if !value.contains('%') {
        return Some(value.to_owned());
    }

    let mut out = Vec::with_capacity(value.len());
    let mut bytes = value.as_bytes();

    while let [b, rest @ ..] = bytes {
        if *b == b'%' {
            let escape = rest.get(..2)?;
            out.extend(hex_decode(escape)?);
            bytes = &rest[2..];
        } else {
            out.push(*b);
            bytes = rest;
        }
    }

    String::from_utf8(out).ok()
}
