use std::sync::{Mutex, MutexGuard, PoisonError};

/// Trim whitespace from end of bytes.
pub(crate) fn trim_end(mut bytes: &[u8]) -> &[u8] {
    while let [prefix @ .., c] = bytes {
        if !c.is_ascii_whitespace() {
            break;
        }

        bytes = prefix;
    }

    bytes
}

/// Split once at the given byte.
pub(crate) fn split_once(bytes: &[u8], byte: u8) -> Option<(&[u8], &[u8])> {
    let n = bytes.iter().position(|&c| c == byte)?;
    let (head, tail) = bytes.split_at(n);
    Some((head, tail.get(1..).unwrap_or_default()))
}

/// Encode bytes as lowercase ascii hex.
pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    const HEX: [u8; 16] = *b"0123456789abcdef";

    let mut out = String::with_capacity(bytes.len() * 2);

    for &b in bytes {
        out.push(char::from(HEX[usize::from(b >> 4)]));
        out.push(char::from(HEX[usize::from(b & 0xf)]));
    }

    out
}

/// Decode ascii hex into bytes.
pub(crate) fn hex_decode(hex: &[u8]) -> Option<Vec<u8>> {
    fn nibble(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    if hex.len() % 2 != 0 {
        return None;
    }

    hex.chunks_exact(2)
        .map(|pair| Some(nibble(pair[0])? << 4 | nibble(pair[1])?))
        .collect()
}

/// Lock a mutex, recovering the guard if it was poisoned.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Test if `name` is a valid member name.
pub(crate) fn is_member_name(name: &str) -> bool {
    let mut bytes = name.bytes();

    let Some(first) = bytes.next() else {
        return false;
    };

    name.len() <= 255
        && (first.is_ascii_alphabetic() || first == b'_')
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Test if `name` is a valid interface or error name.
pub(crate) fn is_interface_name(name: &str) -> bool {
    name.len() <= 255 && name.split('.').count() >= 2 && name.split('.').all(is_member_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex() {
        assert_eq!(hex_encode(b"1000"), "31303030");
        assert_eq!(hex_decode(b"31303030").as_deref(), Some(&b"1000"[..]));
        assert_eq!(hex_decode(b"3"), None);
        assert_eq!(hex_decode(b"zz"), None);
    }

    #[test]
    fn split() {
        assert_eq!(
            split_once(b"OK 1234", b' '),
            Some((&b"OK"[..], &b"1234"[..]))
        );
        assert_eq!(split_once(b"BEGIN", b' '), None);
        assert_eq!(trim_end(b"BEGIN\r\n"), b"BEGIN");
    }

    #[test]
    fn names() {
        assert!(is_member_name("GetAll"));
        assert!(is_member_name("_private2"));
        assert!(!is_member_name(""));
        assert!(!is_member_name("2fast"));
        assert!(!is_member_name("Get.All"));

        assert!(is_interface_name("org.freedesktop.DBus"));
        assert!(!is_interface_name("org"));
        assert!(!is_interface_name("org..DBus"));
        assert!(!is_interface_name("org.1freedesktop"));
    }
}
