use alloc::string::{String, ToString};
use core::fmt;

use thiserror::Error;

use crate::TypeKey;

// -----------------------------------------------------------------------------
// Capability

/// The kind of capability that produced a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Creator,
    Factory,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creator => f.write_str("creator"),
            Self::Factory => f.write_str("factory"),
        }
    }
}

// -----------------------------------------------------------------------------
// ContractError

/// Errors raised while resolving contracts or converting values through them.
///
/// `NoContract`, `TypeMismatch`, `DuplicateReturn` and `Recursive` describe
/// resolution failures, they are never retried or recovered internally.
/// The remaining variants come from conversion.
#[derive(Debug, Error)]
pub enum ContractError {
    /// No declared or registered capability produced a contract for the type.
    #[error("`{0}` has no contract")]
    NoContract(TypeKey),

    /// A creator or factory returned a contract bound to another type.
    #[error("contract {capability} `{name}` created contract of type `{actual}` instead of `{expected}`")]
    TypeMismatch {
        capability: Capability,
        name: &'static str,
        expected: TypeKey,
        actual: TypeKey,
    },

    /// A factory returned a second contract within one request.
    #[error("contract factory `{factory}` returned a second contract for `{ty}`")]
    DuplicateReturn { factory: &'static str, ty: TypeKey },

    /// Building the contract of `ty` requested the contract of `ty` again.
    #[error("contract of `{0}` was requested while it was being built")]
    Recursive(TypeKey),

    /// The contract of the type has no way to write values.
    #[error("contract of `{0}` cannot write values")]
    NotWritable(TypeKey),

    /// The contract of the type has no way to read values.
    #[error("contract of `{0}` cannot read values")]
    NotReadable(TypeKey),

    /// A value handed to a contract is not of the contract type.
    #[error("expected a value of type `{expected}`")]
    ValueMismatch { expected: &'static str },

    /// Error reported by the underlying serializer or deserializer.
    #[error(transparent)]
    Serde(#[from] erased_serde::Error),

    /// Error reported by a creator, converter or middleware.
    #[error("{0}")]
    Custom(String),
}

impl ContractError {
    /// Creates a [`ContractError::Custom`] from a displayable message.
    #[inline]
    pub fn custom(msg: impl fmt::Display) -> Self {
        Self::Custom(msg.to_string())
    }

    /// Returns `true` for errors raised by resolution rather than conversion.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::NoContract(_)
                | Self::TypeMismatch { .. }
                | Self::DuplicateReturn { .. }
                | Self::Recursive(_)
        )
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Capability, ContractError};
    use crate::TypeKey;

    #[test]
    fn mismatch_names_both_types() {
        let err = ContractError::TypeMismatch {
            capability: Capability::Factory,
            name: "my::Factory",
            expected: TypeKey::of::<u8>(),
            actual: TypeKey::of::<u16>(),
        };
        let msg = err.to_string();
        assert_eq!(
            msg,
            "contract factory `my::Factory` created contract of type `u16` instead of `u8`"
        );
        assert!(err.is_resolution());
    }

    #[test]
    fn custom_is_not_resolution() {
        let err = ContractError::custom("bad input");
        assert_eq!(err.to_string(), "bad input");
        assert!(!err.is_resolution());
    }
}
