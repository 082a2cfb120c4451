//! Authentication error types.
//!
//! Every failure of the identity component surfaces as an [`AuthError`]. The
//! public translation into [`ApiError`] collapses every credential problem to
//! a generic rejection so callers cannot tell a missing account from a wrong
//! secret, or an expired token from a forged one.

use carelink_api::ApiError;
use carelink_core::{ErrorKind, FieldErrors};
use carelink_storage::{StorageError, constraints};

use crate::token::TokenKind;

pub(crate) const MSG_NO_ACTIVE_ACCOUNT: &str = "No active account found with the given credentials";
pub(crate) const MSG_TOKEN_REJECTED: &str = "Given token not valid for any token type";
pub(crate) const MSG_NOT_PROVIDED: &str = "Authentication credentials were not provided.";
pub(crate) const MSG_DUPLICATE_EMAIL: &str = "A user with this email already exists.";

/// Errors that can occur during identity and session operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Registration or login input failed validation.
    #[error("Validation failed: {errors}")]
    Validation {
        /// Messages keyed by input field.
        errors: FieldErrors,
    },

    /// No active principal matches the given email and secret.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The token is malformed, forged or issued by someone else.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// A token of the wrong kind was presented.
    #[error("Wrong token kind: expected {expected}")]
    WrongTokenKind {
        /// The kind that was required.
        expected: TokenKind,
    },

    /// The request carries no usable credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// An error occurred while storing or retrieving principals.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation { errors }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::InvalidCredentials
            | Self::InvalidToken { .. }
            | Self::TokenExpired
            | Self::WrongTokenKind { .. }
            | Self::Unauthorized { .. } => ErrorKind::Authentication,
            Self::Storage { .. } | Self::Internal { .. } => ErrorKind::Internal,
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        if err.is_unique_violation_of(constraints::PRINCIPAL_LOGIN_ID) {
            return Self::validation(FieldErrors::single("email", MSG_DUPLICATE_EMAIL));
        }
        Self::storage(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation { errors } => ApiError::validation(errors),
            AuthError::InvalidCredentials => ApiError::unauthorized(MSG_NO_ACTIVE_ACCOUNT),
            AuthError::Unauthorized { .. } => ApiError::unauthorized(MSG_NOT_PROVIDED),
            AuthError::InvalidToken { .. }
            | AuthError::TokenExpired
            | AuthError::WrongTokenKind { .. } => ApiError::unauthorized(MSG_TOKEN_REJECTED),
            other => ApiError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_token("bad signature");
        assert_eq!(err.to_string(), "Invalid token: bad signature");

        let err = AuthError::WrongTokenKind {
            expected: TokenKind::Refresh,
        };
        assert_eq!(err.to_string(), "Wrong token kind: expected refresh");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(AuthError::InvalidCredentials.kind(), ErrorKind::Authentication);
        assert_eq!(AuthError::TokenExpired.kind(), ErrorKind::Authentication);
        assert_eq!(
            AuthError::validation(FieldErrors::single("email", "bad")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(AuthError::storage("down").kind(), ErrorKind::Internal);
        assert_eq!(AuthError::unauthorized("x").kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_duplicate_login_becomes_field_error() {
        let err: AuthError = StorageError::unique_violation(constraints::PRINCIPAL_LOGIN_ID).into();
        match err {
            AuthError::Validation { errors } => {
                assert_eq!(errors.get("email"), [MSG_DUPLICATE_EMAIL.to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err: AuthError = StorageError::connection_error("refused").into();
        assert!(matches!(err, AuthError::Storage { .. }));
    }

    #[test]
    fn test_token_failures_are_indistinguishable() {
        let expired = ApiError::from(AuthError::TokenExpired);
        let forged = ApiError::from(AuthError::invalid_token("InvalidSignature"));
        let wrong_kind = ApiError::from(AuthError::WrongTokenKind {
            expected: TokenKind::Session,
        });
        assert_eq!(expired.to_string(), forged.to_string());
        assert_eq!(forged.to_string(), wrong_kind.to_string());
        assert_eq!(expired.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let api = ApiError::from(AuthError::storage("relation principals does not exist"));
        assert_eq!(api.kind(), ErrorKind::Internal);
        let body = api.to_error_body();
        assert_eq!(body.error.message, "Internal server error");
    }
}
