//! Validated object paths.

use self::validation::validate;
mod validation;

pub use self::iter::Iter;
mod iter;

pub use self::object_path_error::ObjectPathError;
mod object_path_error;

pub use self::object_path::ObjectPath;
mod object_path;

#[cfg(test)]
mod tests;
