//! The D-Bus type signature grammar.

#[cfg(test)]
mod tests;

pub use self::ty::Type;
mod ty;

pub use self::parser::parse;
pub(crate) use self::parser::parse_single;
mod parser;

pub use self::signature::Signature;
mod signature;

pub use self::signature_error::{SignatureError, SignatureErrorKind};
mod signature_error;

/// The maximum size of a signature.
pub const MAX_SIGNATURE: usize = 255;

/// The maximum individual container depth.
pub const MAX_CONTAINER_DEPTH: usize = 32;

/// The maximum total depth of any containers.
pub const MAX_DEPTH: usize = MAX_CONTAINER_DEPTH * 2;
