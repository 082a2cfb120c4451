//! JWT token generation and validation.
//!
//! Tokens are signed with a server-held secret using HS256. Expiry is checked
//! against the injected [`Clock`](carelink_core::Clock) rather than the
//! library's own system time lookup, so tests can move time explicitly.
//!
//! ## Example
//!
//! ```ignore
//! use carelink_auth::token::{Claims, JwtService};
//!
//! let service = JwtService::new(secret.as_bytes(), "carelink", clock.clone());
//! let claims = Claims::refresh("carelink", 42, clock.now(), lifetime);
//! let token = service.encode(&claims)?;
//! let decoded = service.decode(&token)?;
//! assert_eq!(decoded.principal_id()?, 42);
//! ```

use std::fmt;
use std::time::Duration;

use carelink_core::{PrincipalId, SharedClock};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },

    /// A required claim is missing.
    #[error("Missing required claim: {claim}")]
    MissingClaim {
        /// Name of the missing claim.
        claim: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Creates a new `MissingClaim` error.
    #[must_use]
    pub fn missing_claim(claim: impl Into<String>) -> Self {
        Self::MissingClaim {
            claim: claim.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidIssuer | ErrorKind::InvalidSubject => {
                Self::invalid_claims(err.to_string())
            }
            ErrorKind::MissingRequiredClaim(claim) => Self::missing_claim(claim.clone()),
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

impl From<JwtError> for crate::error::AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::TokenExpired,
            JwtError::EncodingError { message } => Self::internal(message),
            other => Self::invalid_token(other.to_string()),
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

/// Distinguishes short-lived session tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Proves authentication on every protected call.
    Session,
    /// Only usable to mint new session tokens.
    Refresh,
}

impl TokenKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Session => "session",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Issuer.
    pub iss: String,

    /// Subject (principal id).
    pub sub: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// JWT ID.
    pub jti: String,

    /// Session or refresh.
    pub token_type: TokenKind,

    /// Principal email (session tokens only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Principal display name (session tokens only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Claims {
    fn base(
        kind: TokenKind,
        issuer: &str,
        principal_id: PrincipalId,
        now: OffsetDateTime,
        lifetime: Duration,
    ) -> Self {
        let iat = now.unix_timestamp();
        let lifetime = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        Self {
            iss: issuer.to_string(),
            sub: principal_id.to_string(),
            iat,
            exp: iat.saturating_add(lifetime),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: kind,
            email: None,
            name: None,
        }
    }

    /// Claims for a session token carrying the principal's email and name.
    #[must_use]
    pub fn session(
        issuer: &str,
        principal_id: PrincipalId,
        email: &str,
        name: &str,
        now: OffsetDateTime,
        lifetime: Duration,
    ) -> Self {
        Self {
            email: Some(email.to_string()),
            name: Some(name.to_string()),
            ..Self::base(TokenKind::Session, issuer, principal_id, now, lifetime)
        }
    }

    /// Claims for a refresh token carrying only the principal id.
    #[must_use]
    pub fn refresh(
        issuer: &str,
        principal_id: PrincipalId,
        now: OffsetDateTime,
        lifetime: Duration,
    ) -> Self {
        Self::base(TokenKind::Refresh, issuer, principal_id, now, lifetime)
    }

    /// Parses the subject as a principal id.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidClaims` if `sub` is not an integer.
    pub fn principal_id(&self) -> Result<PrincipalId, JwtError> {
        self.sub
            .parse()
            .map_err(|_| JwtError::invalid_claims("sub is not a principal id"))
    }

    /// Returns `true` once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.exp <= now.unix_timestamp()
    }
}

/// The identity proven by a valid session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedPrincipal {
    pub id: PrincipalId,
    pub email: String,
    pub name: String,
}

impl TryFrom<Claims> for AuthenticatedPrincipal {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims.principal_id()?;
        Ok(Self {
            id,
            email: claims.email.ok_or_else(|| JwtError::missing_claim("email"))?,
            name: claims.name.ok_or_else(|| JwtError::missing_claim("name"))?,
        })
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Service for encoding and decoding JWT tokens.
///
/// This service is thread-safe (`Send + Sync`) and can be shared across
/// async tasks.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    clock: SharedClock,
}

impl JwtService {
    /// Creates a new JWT service.
    ///
    /// # Arguments
    /// * `secret` - The symmetric signing secret
    /// * `issuer` - The issuer claim value
    /// * `clock` - Time source for expiry checks
    #[must_use]
    pub fn new(secret: &[u8], issuer: impl Into<String>, clock: SharedClock) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            clock,
        }
    }

    /// Encodes claims into a JWT string.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes a JWT string, checking signature, issuer and expiry.
    ///
    /// # Errors
    /// Returns `JwtError::Expired` once the clock reaches `exp`, and another
    /// variant for any signature, format or claim problem.
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = false; // Checked against the injected clock below
        validation.validate_aud = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;
        if claims.is_expired_at(self.clock.now()) {
            return Err(JwtError::Expired);
        }
        Ok(claims)
    }

    /// Returns the issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the current time according to the service clock.
    #[must_use]
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }
}

impl fmt::Debug for JwtService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
