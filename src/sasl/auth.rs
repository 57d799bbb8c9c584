use std::fmt;

use crate::utils::hex_encode;

/// A SASL mechanism supported by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Mechanism {
    /// Credentials passed out of band, such as the uid of a unix socket peer.
    External,
    /// No authentication at all.
    Anonymous,
}

impl Mechanism {
    /// The name of the mechanism on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Mechanism::External => "EXTERNAL",
            Mechanism::Anonymous => "ANONYMOUS",
        }
    }

    /// Look up a mechanism by its wire name.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"EXTERNAL" => Some(Mechanism::External),
            b"ANONYMOUS" => Some(Mechanism::Anonymous),
            _ => None,
        }
    }
}

impl fmt::Display for Mechanism {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The SASL authentication method offered by a client, together with its
/// initial response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// EXTERNAL authentication with a literal, ascii hex encoded payload.
    External(Box<[u8]>),
    /// ANONYMOUS authentication with an ascii hex encoded trace string.
    Anonymous(Box<[u8]>),
}

impl Auth {
    /// Construct external authentication from the uid of the current
    /// process.
    #[cfg(all(unix, feature = "libc"))]
    pub fn external_from_uid() -> Auth {
        // SAFETY: getuid is always successful.
        let id = unsafe { libc::getuid() };
        Self::external_from_u32_ascii_hex(id)
    }

    /// Construct an external authentication from a u32.
    ///
    /// The payload is the decimal representation of the id, hex encoded.
    pub fn external_from_u32_ascii_hex(mut id: u32) -> Auth {
        const HEX: [u8; 16] = *b"0123456789abcdef";

        let mut buf = [0u8; 32];
        let mut n = 0;

        if id == 0 {
            buf[0] = b'3';
            buf[1] = b'0';
            n = 2;
        } else {
            while id > 0 {
                let byte = (id % 10) as u8 + b'0';
                buf[n] = HEX[(byte & 0xf) as usize];
                n += 1;
                buf[n] = HEX[(byte >> 4) as usize];
                n += 1;
                id /= 10;
            }

            buf[..n].reverse();
        }

        Auth::External(buf[..n].into())
    }

    /// Construct anonymous authentication with the given trace string.
    pub fn anonymous(trace: &str) -> Auth {
        Auth::Anonymous(hex_encode(trace.as_bytes()).into_bytes().into())
    }

    /// The mechanism of the authentication.
    pub fn mechanism(&self) -> Mechanism {
        match self {
            Auth::External(..) => Mechanism::External,
            Auth::Anonymous(..) => Mechanism::Anonymous,
        }
    }

    /// The hex encoded initial response, if any.
    pub fn initial_response(&self) -> Option<&[u8]> {
        let (Auth::External(data) | Auth::Anonymous(data)) = self;

        if data.is_empty() {
            None
        } else {
            Some(data)
        }
    }

    /// The default authentication methods, tried in order.
    pub fn defaults() -> Vec<Auth> {
        let mut auth = Vec::new();

        #[cfg(all(unix, feature = "libc"))]
        auth.push(Self::external_from_uid());

        auth.push(Self::anonymous(concat!("dbus-peer ", env!("CARGO_PKG_VERSION"))));
        auth
    }
}
