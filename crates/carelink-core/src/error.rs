//! Error taxonomy shared by every Carelink component.
//!
//! Each crate defines its own error enum, but all of them classify into one of
//! the kinds below. The transport layer maps a kind to a stable status class.

use std::fmt;

/// The error kinds a Carelink operation can surface to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-policy input. Carries field-level detail.
    Validation,
    /// Missing, invalid or expired credential.
    Authentication,
    /// Resource absent or not visible to the caller.
    NotFound,
    /// Uniqueness or referential-integrity violation.
    Conflict,
    /// Anything else. Never exposes implementation detail.
    Internal,
}

impl ErrorKind {
    /// Returns the stable machine-readable name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }

    /// Returns `true` if the caller is responsible for the failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::Validation.to_string(), "validation");
        assert_eq!(ErrorKind::Authentication.to_string(), "authentication");
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
        assert_eq!(ErrorKind::Conflict.to_string(), "conflict");
        assert_eq!(ErrorKind::Internal.to_string(), "internal");
    }

    #[test]
    fn test_client_error_predicate() {
        assert!(ErrorKind::Validation.is_client_error());
        assert!(ErrorKind::Conflict.is_client_error());
        assert!(!ErrorKind::Internal.is_client_error());
    }
}
