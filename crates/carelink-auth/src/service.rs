//! The identity service: registration, login and session verification.

use std::sync::Arc;
use std::time::Duration;

use carelink_core::validation::MSG_BLANK;
use carelink_core::{FieldErrors, PrincipalId, SharedClock, is_valid_email};
use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::config::{AuthConfig, ConfigError};
use crate::error::{AuthError, MSG_DUPLICATE_EMAIL};
use crate::password::{self, PasswordPolicy, UserAttributes};
use crate::storage::{CredentialStore, NewPrincipal, Principal};
use crate::token::{AuthenticatedPrincipal, Claims, JwtService, TokenKind};

const MAX_NAME_CHARS: usize = 150;
const MSG_INVALID_EMAIL: &str = "Enter a valid email address.";

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration input. Every field is optional on the wire so missing fields
/// are reported as validation errors rather than parse failures.
#[derive(Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login input.
#[derive(Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Refresh input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

impl RefreshRequest {
    /// Returns the refresh token, or a field error if it is missing or blank.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` when `refresh` is absent or blank.
    pub fn into_token(self) -> AuthResult<String> {
        let mut errors = FieldErrors::new();
        let token = errors.require("refresh", self.refresh);
        if token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            errors.add("refresh", MSG_BLANK);
        }
        errors.into_result(token.unwrap_or_default()).map_err(AuthError::validation)
    }
}

/// Public view of a registered principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalSummary {
    pub id: PrincipalId,
    pub name: String,
    pub email: String,
}

impl From<&Principal> for PrincipalSummary {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id,
            name: principal.name.clone(),
            email: principal.email.clone(),
        }
    }
}

/// Tokens issued on login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

/// Token issued on refresh.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access: String,
}

// =============================================================================
// Identity Service
// =============================================================================

/// Registers principals and issues and verifies their tokens.
///
/// Holds only read-only configuration besides the store handle, so a single
/// instance is shared across all requests.
pub struct IdentityService {
    store: Arc<dyn CredentialStore>,
    jwt: JwtService,
    policy: PasswordPolicy,
    session_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl IdentityService {
    /// Creates the service from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `config` fails validation.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        config: &AuthConfig,
        clock: SharedClock,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store,
            jwt: JwtService::new(config.signing_secret.as_bytes(), &config.issuer, clock),
            policy: PasswordPolicy::from_config(&config.password),
            session_lifetime: config.session_token_lifetime,
            refresh_lifetime: config.refresh_token_lifetime,
        })
    }

    /// Validates registration input and creates an active principal.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a missing or malformed field, a
    /// taken email or a password that breaks the policy. Nothing is written
    /// in that case.
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<PrincipalSummary> {
        let mut errors = FieldErrors::new();

        let name = errors
            .require("name", request.name)
            .map(|n| n.trim().to_string());
        if let Some(name) = &name {
            errors.check_text("name", name, MAX_NAME_CHARS);
        }

        let email = errors
            .require("email", request.email)
            .map(|e| e.trim().to_string());
        if let Some(email) = &email {
            if email.is_empty() {
                errors.add("email", MSG_BLANK);
            } else if !is_valid_email(email) {
                errors.add("email", MSG_INVALID_EMAIL);
            }
        }

        let secret = errors.require("password", request.password);
        if let Some(secret) = &secret {
            if secret.is_empty() {
                errors.add("password", MSG_BLANK);
            } else {
                let user = UserAttributes::new(
                    name.as_deref().unwrap_or_default(),
                    email.as_deref().unwrap_or_default(),
                );
                if let Err(messages) = self.policy.validate(secret, &user) {
                    for message in messages {
                        errors.add("password", message);
                    }
                }
            }
        }

        if let Some(email) = email.as_deref().filter(|_| !errors.contains("email"))
            && self.store.find_by_login_id(email).await?.is_some()
        {
            errors.add("email", MSG_DUPLICATE_EMAIL);
        }

        let (Some(name), Some(email), Some(secret)) = errors
            .into_result((name, email, secret))
            .map_err(AuthError::validation)?
        else {
            return Err(AuthError::internal("validated registration is incomplete"));
        };

        let secret_hash = password::hash_secret_blocking(secret).await?;
        let principal = self
            .store
            .save(
                NewPrincipal::active(email, name, secret_hash),
                self.jwt.now(),
            )
            .await?;

        tracing::info!(principal_id = principal.id, "principal registered");
        Ok(PrincipalSummary::from(&principal))
    }

    /// Verifies credentials and issues a session and a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email, a wrong
    /// secret or an inactive principal alike.
    pub async fn login(&self, request: LoginRequest) -> AuthResult<TokenPair> {
        let mut errors = FieldErrors::new();
        let email = errors.require("email", request.email);
        let secret = errors.require("password", request.password);
        if email.as_deref().is_some_and(|e| e.trim().is_empty()) {
            errors.add("email", MSG_BLANK);
        }
        if secret.as_deref().is_some_and(str::is_empty) {
            errors.add("password", MSG_BLANK);
        }
        let (Some(email), Some(secret)) = errors
            .into_result((email, secret))
            .map_err(AuthError::validation)?
        else {
            return Err(AuthError::internal("validated login is incomplete"));
        };

        let Some(principal) = self.store.find_by_login_id(email.trim()).await? else {
            password::hash::verify_dummy(secret).await;
            tracing::debug!("login rejected: unknown login identifier");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = self.store.verify_secret(&principal, &secret).await?;
        if !matches || !principal.is_active {
            tracing::debug!(principal_id = principal.id, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.jwt.now();
        let refresh = Claims::refresh(self.jwt.issuer(), principal.id, now, self.refresh_lifetime);
        let pair = TokenPair {
            refresh: self.jwt.encode(&refresh)?,
            access: self.issue_session(&principal)?,
        };
        tracing::info!(principal_id = principal.id, "login succeeded");
        Ok(pair)
    }

    /// Verifies a session token and returns the principal it proves.
    ///
    /// Pure: consults only the signature, the claims and the clock.
    ///
    /// # Errors
    ///
    /// Returns an authentication error for a malformed, forged, expired or
    /// refresh token.
    pub fn verify_session(&self, token: &str) -> AuthResult<AuthenticatedPrincipal> {
        let claims = self.jwt.decode(token)?;
        if claims.token_type != TokenKind::Session {
            return Err(AuthError::WrongTokenKind {
                expected: TokenKind::Session,
            });
        }
        Ok(AuthenticatedPrincipal::try_from(claims)?)
    }

    /// Mints a new session token from a refresh token.
    ///
    /// The refresh token itself is not renewed; once it lapses the principal
    /// must log in again.
    ///
    /// # Errors
    ///
    /// Returns an authentication error for a malformed, forged, expired or
    /// session token, or when the principal no longer exists or is inactive.
    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AccessToken> {
        let claims = self.jwt.decode(refresh_token)?;
        if claims.token_type != TokenKind::Refresh {
            return Err(AuthError::WrongTokenKind {
                expected: TokenKind::Refresh,
            });
        }

        let principal_id = claims.principal_id()?;
        let principal = self
            .store
            .find_by_id(principal_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AuthError::invalid_token("principal is missing or inactive"))?;

        Ok(AccessToken {
            access: self.issue_session(&principal)?,
        })
    }

    fn issue_session(&self, principal: &Principal) -> AuthResult<String> {
        let claims = Claims::session(
            self.jwt.issuer(),
            principal.id,
            &principal.email,
            &principal.name,
            self.jwt.now(),
            self.session_lifetime,
        );
        Ok(self.jwt.encode(&claims)?)
    }
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("jwt", &self.jwt)
            .field("policy", &self.policy)
            .field("session_lifetime", &self.session_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish_non_exhaustive()
    }
}
