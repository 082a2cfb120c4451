//! Principal storage trait.
//!
//! Defines the interface for principal persistence operations.

use async_trait::async_trait;
use carelink_core::PrincipalId;
use carelink_storage::{StorageError, StorageResult};
use time::OffsetDateTime;

use crate::password;

// =============================================================================
// Principal Type
// =============================================================================

/// A registered principal.
///
/// The secret hash never leaves the identity component; responses use
/// [`crate::PrincipalSummary`].
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    /// Unique identifier.
    pub id: PrincipalId,

    /// Unique login identifier (the email address, stored verbatim).
    pub login_id: String,

    /// Email address.
    pub email: String,

    /// Display name.
    pub name: String,

    /// Argon2 PHC hash of the secret.
    pub secret_hash: String,

    /// Inactive principals cannot log in or refresh.
    pub is_active: bool,

    /// When the principal registered.
    pub created_at: OffsetDateTime,
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("login_id", &self.login_id)
            .field("name", &self.name)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

/// A principal to be inserted.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPrincipal {
    pub login_id: String,
    pub email: String,
    pub name: String,
    pub secret_hash: String,
    pub is_active: bool,
}

impl NewPrincipal {
    /// An active principal whose login identifier is its email.
    #[must_use]
    pub fn active(email: impl Into<String>, name: impl Into<String>, secret_hash: String) -> Self {
        let email = email.into();
        Self {
            login_id: email.clone(),
            email,
            name: name.into(),
            secret_hash,
            is_active: true,
        }
    }

    /// Materializes the stored row.
    #[must_use]
    pub fn into_principal(self, id: PrincipalId, created_at: OffsetDateTime) -> Principal {
        Principal {
            id,
            login_id: self.login_id,
            email: self.email,
            name: self.name,
            secret_hash: self.secret_hash,
            is_active: self.is_active,
            created_at,
        }
    }
}

impl std::fmt::Debug for NewPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewPrincipal")
            .field("login_id", &self.login_id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Credential Store Trait
// =============================================================================

/// Storage for principals.
///
/// The lifecycle of principals is owned by the store; the identity service
/// only looks them up and saves new ones.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Finds a principal by exact (case-sensitive) login identifier.
    async fn find_by_login_id(&self, login_id: &str) -> StorageResult<Option<Principal>>;

    /// Finds a principal by id.
    async fn find_by_id(&self, id: PrincipalId) -> StorageResult<Option<Principal>>;

    /// Persists a new principal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UniqueViolation` with
    /// [`carelink_storage::constraints::PRINCIPAL_LOGIN_ID`] if the login
    /// identifier is taken.
    async fn save(&self, principal: NewPrincipal, at: OffsetDateTime) -> StorageResult<Principal>;

    /// Removes a principal and every patient it owns. Returns `false` if it
    /// did not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ForeignKeyViolation` if a mapping references one
    /// of the owned patients; nothing is removed in that case.
    async fn delete(&self, id: PrincipalId) -> StorageResult<bool>;

    /// Checks `plaintext` against the principal's stored hash.
    ///
    /// The default implementation verifies the Argon2 hash on the blocking
    /// thread pool.
    async fn verify_secret(&self, principal: &Principal, plaintext: &str) -> StorageResult<bool> {
        password::verify_secret_blocking(plaintext.to_string(), principal.secret_hash.clone())
            .await
            .map_err(|e| StorageError::internal(e.to_string()))
    }
}
