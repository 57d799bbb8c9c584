use crate::error::{ErrorKind, Result};
use crate::signature::Type;

use super::Value;

/// A homogeneous array of values.
///
/// The element type is kept alongside the values so that empty arrays retain
/// their signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    element: Type,
    values: Vec<Value>,
}

impl Array {
    /// Construct a new array, checking that every value conforms to
    /// `element`.
    pub fn new(element: Type, values: impl IntoIterator<Item = Value>) -> Result<Self> {
        let values = values.into_iter().collect::<Vec<_>>();

        if let Some(value) = values.iter().find(|v| !v.conforms_to(&element)) {
            tracing::trace!(?value, %element, "array element does not conform");

            return Err(ErrorKind::ValueMismatch {
                expected: element.to_string(),
            }
            .into());
        }

        Ok(Self { element, values })
    }

    /// Construct an empty array with the given element type.
    pub fn empty(element: Type) -> Self {
        Self {
            element,
            values: Vec::new(),
        }
    }

    /// Construct an `ay` array.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            element: Type::Byte,
            values: bytes.iter().copied().map(Value::Byte).collect(),
        }
    }

    /// The type of the elements.
    #[inline]
    pub fn element(&self) -> &Type {
        &self.element
    }

    /// The elements of the array.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Convert into the elements of the array.
    #[inline]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Append a value which is already known to conform.
    #[inline]
    pub(crate) fn push_unchecked(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Number of elements in the array.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Test if the array is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
