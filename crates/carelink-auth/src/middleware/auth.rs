//! Bearer token authentication extractor.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AuthError;
use crate::service::IdentityService;
use crate::token::AuthenticatedPrincipal;

// =============================================================================
// Auth State
// =============================================================================

/// State required for bearer token authentication.
///
/// Include it in the application state and expose it to [`BearerAuth`] via
/// `FromRef`.
///
/// ```ignore
/// impl FromRef<AppState> for AuthState {
///     fn from_ref(state: &AppState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone, Debug)]
pub struct AuthState {
    /// Identity service used to verify session tokens.
    pub identity: Arc<IdentityService>,
}

impl AuthState {
    /// Creates a new auth state.
    pub fn new(identity: Arc<IdentityService>) -> Self {
        Self { identity }
    }
}

// =============================================================================
// Bearer Auth Extractor
// =============================================================================

/// Axum extractor that validates a session token from
/// `Authorization: Bearer <token>`.
///
/// # Errors
///
/// Rejects with `AuthError` (which implements `IntoResponse`) if the header
/// is missing or malformed, or the token is invalid, expired or a refresh
/// token.
pub struct BearerAuth(pub AuthenticatedPrincipal);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let token = bearer_token(parts)?;

        let principal = auth_state.identity.verify_session(token).map_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
            e
        })?;

        tracing::Span::current().record("principal_id", principal.id);
        Ok(BearerAuth(principal))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| AuthError::unauthorized("Authorization header is not valid UTF-8"))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AuthError::unauthorized("Malformed Authorization header"))?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::unauthorized("Unsupported authorization scheme"));
    }

    let token = token.trim();
    if token.is_empty() || token.contains(' ') {
        return Err(AuthError::invalid_token("Malformed Bearer token"));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/patients");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");

        let parts = self::parts(Some("bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_or_garbled_header() {
        assert!(matches!(
            bearer_token(&parts(None)),
            Err(AuthError::Unauthorized { .. })
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Basic dXNlcjpwYXNz"))),
            Err(AuthError::Unauthorized { .. })
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Bearer"))),
            Err(AuthError::Unauthorized { .. })
        ));
        assert!(matches!(
            bearer_token(&parts(Some("Bearer a b"))),
            Err(AuthError::InvalidToken { .. })
        ));
    }
}
