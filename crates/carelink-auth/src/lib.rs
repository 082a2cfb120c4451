//! # carelink-auth
//!
//! Identity and session management for the Carelink service.
//!
//! This crate provides:
//! - the [`CredentialStore`] contract for persisting principals
//! - a composable password policy and Argon2id secret hashing
//! - HS256 session and refresh tokens
//! - [`IdentityService`]: register, login, verify and refresh
//! - the axum [`BearerAuth`] extractor
//!
//! ## Modules
//!
//! - [`config`] - Token lifetimes, signing secret and password policy settings
//! - [`password`] - Password validators and hashing
//! - [`token`] - JWT claims and encoding
//! - [`storage`] - Credential store trait and principal types
//! - [`service`] - The identity service
//! - [`middleware`] - HTTP extractors and error responses

pub mod config;
pub mod error;
pub mod middleware;
pub mod password;
pub mod service;
pub mod storage;
pub mod token;

pub use config::{AuthConfig, ConfigError, PasswordPolicyConfig};
pub use error::AuthError;
pub use middleware::{AuthState, BearerAuth};
pub use password::{PasswordPolicy, PasswordValidator, UserAttributes};
pub use service::{
    AccessToken, IdentityService, LoginRequest, PrincipalSummary, RefreshRequest,
    RegisterRequest, TokenPair,
};
pub use storage::{CredentialStore, NewPrincipal, Principal};
pub use token::{AuthenticatedPrincipal, Claims, JwtError, JwtService, TokenKind};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::AuthConfig;
    pub use crate::error::AuthError;
    pub use crate::middleware::{AuthState, BearerAuth};
    pub use crate::service::IdentityService;
    pub use crate::storage::{CredentialStore, NewPrincipal, Principal};
    pub use crate::token::{AuthenticatedPrincipal, TokenKind};
}
