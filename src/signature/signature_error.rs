use thiserror::Error;

/// Detailed errors raised when a signature fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(transparent)]
pub struct SignatureError {
    kind: SignatureErrorKind,
}

impl SignatureError {
    #[inline]
    pub(crate) const fn new(kind: SignatureErrorKind) -> Self {
        Self { kind }
    }

    /// Indicate that a signature is too long.
    #[inline]
    pub const fn too_long() -> Self {
        Self::new(SignatureErrorKind::SignatureTooLong)
    }

    /// Get the kind of the error.
    #[inline]
    pub fn kind(&self) -> &SignatureErrorKind {
        &self.kind
    }
}

/// The specific grammar violation of a [`SignatureError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SignatureErrorKind {
    #[error("Unknown type code: {:?}", code_char(.0))]
    UnknownTypeCode(u8),
    #[error("Signature too long")]
    SignatureTooLong,
    #[error("Missing array element type")]
    MissingArrayElementType,
    #[error("Struct ended but not started")]
    StructEndedButNotStarted,
    #[error("Dict ended but not started")]
    DictEndedButNotStarted,
    #[error("Struct started but not ended")]
    StructStartedButNotEnded,
    #[error("Dict started but not ended")]
    DictStartedButNotEnded,
    #[error("Struct has no fields")]
    StructHasNoFields,
    #[error("Dict key must be basic type")]
    DictKeyMustBeBasicType,
    #[error("Dict entry has no fields")]
    DictEntryHasNoFields,
    #[error("Dict entry has only one field")]
    DictEntryHasOnlyOneField,
    #[error("Dict entry not inside array")]
    DictEntryNotInsideArray,
    #[error("Exceeded maximum array recursion")]
    ExceededMaximumArrayRecursion,
    #[error("Exceeded maximum struct recursion")]
    ExceededMaximumStructRecursion,
    #[error("Exceeded maximum dict recursion")]
    ExceededMaximumDictRecursion,
    #[error("Dict entry has too many fields")]
    DictEntryHasTooManyFields,
    #[error("Expected a single complete type")]
    NotSingleCompleteType,
}

fn code_char(code: &u8) -> char {
    char::from(*code)
}
