use thiserror::Error;

/// An error constructing an object path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid D-Bus object path {path:?}")]
#[non_exhaustive]
pub struct ObjectPathError {
    path: Box<str>,
}

impl ObjectPathError {
    #[inline]
    pub(super) fn new(path: &str) -> Self {
        Self { path: path.into() }
    }
}
