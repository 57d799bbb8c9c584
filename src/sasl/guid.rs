use std::fmt;

use rand::RngCore;

use crate::utils::hex_encode;

/// The GUID a server identifies itself with in the `OK` response.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Guid(Box<str>);

impl Guid {
    /// Construct a guid from its hex representation.
    ///
    /// Returns `None` if the guid is empty or not ascii hex.
    pub fn new(guid: &str) -> Option<Self> {
        if guid.is_empty() || !guid.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        Some(Self(guid.into()))
    }

    /// Generate a random 128-bit guid.
    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex_encode(&bytes).into())
    }

    /// The hex representation of the guid.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Guid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Guid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Guid").field(&self.0).finish()
    }
}
