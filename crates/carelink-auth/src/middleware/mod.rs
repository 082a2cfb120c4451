//! HTTP middleware for authentication.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use carelink_auth::middleware::{AuthState, BearerAuth};
//!
//! async fn protected_handler(BearerAuth(principal): BearerAuth) -> String {
//!     format!("Hello, {}!", principal.name)
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .with_state(AuthState::new(identity));
//! ```

pub mod auth;
pub mod error;

pub use auth::{AuthState, BearerAuth};
