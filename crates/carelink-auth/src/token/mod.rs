//! Session and refresh tokens.
//!
//! Tokens are stateless: nothing is stored server-side, and the HS256
//! signature plus the `exp` claim are the only integrity mechanism.

pub mod jwt;

pub use jwt::{AuthenticatedPrincipal, Claims, JwtError, JwtService, TokenKind};
